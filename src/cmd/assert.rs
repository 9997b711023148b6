use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::cmd::{CommandError, CommandResponse, respond};
use crate::domain::rules::{ResponseContext, RuleSet, Verdict};
use crate::engine::r#assert::{evaluate_all, reduce};
use crate::io::{self, Format, IoError};

/// Input arguments for assert command execution API.
#[derive(Debug, Clone)]
pub struct AssertCommandArgs {
    pub rules: PathBuf,
    /// Response body; stdin when absent.
    pub input: Option<PathBuf>,
    pub from: Option<Format>,
    pub status_code: i64,
    pub response_time_ms: f64,
}

#[derive(Debug, Serialize)]
struct AssertReport {
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,
    results: Vec<Verdict>,
}

pub fn run_with_stdin<R: Read>(args: &AssertCommandArgs, stdin: R) -> CommandResponse {
    respond(execute(args, stdin))
}

fn execute<R: Read>(args: &AssertCommandArgs, stdin: R) -> Result<CommandResponse, CommandError> {
    let rules = load_rules(args)?;
    let body = load_body(args, stdin)?;

    let context = ResponseContext::new(&body, args.status_code, args.response_time_ms);
    let results = evaluate_all(&rules, &context);
    let aggregate = reduce(&results);
    let report = AssertReport {
        passed: aggregate.passed,
        failure_reason: aggregate.failure_reason,
        results,
    };
    Ok(CommandResponse::report(&report, report.passed))
}

fn load_rules(args: &AssertCommandArgs) -> Result<RuleSet, CommandError> {
    let value = io::reader::read_path(&args.rules).map_err(|err| {
        CommandError::InputUsage(format!(
            "failed to load rules file `{}`: {err}",
            args.rules.display()
        ))
    })?;
    // A file wrapping the rules in a test definition is accepted as-is.
    let rules_value = match value.get("assertions") {
        Some(assertions) => assertions.clone(),
        None => value,
    };
    serde_json::from_value(rules_value)
        .map_err(|err| CommandError::InputUsage(format!("invalid rules schema: {err}")))
}

fn load_body<R: Read>(args: &AssertCommandArgs, stdin: R) -> Result<Value, CommandError> {
    let format = match (&args.input, args.from) {
        (_, Some(format)) => format,
        (Some(path), None) => {
            io::resolve_input_format(None, Some(path)).map_err(map_io_as_input_usage)?
        }
        (None, None) => Format::Json,
    };
    if let Some(path) = &args.input {
        let file = File::open(path).map_err(|err| {
            CommandError::InputUsage(format!(
                "failed to open input file `{}`: {err}",
                path.display()
            ))
        })?;
        io::reader::read_value(file, format).map_err(map_io_as_input_usage)
    } else {
        io::reader::read_value(stdin, format).map_err(map_io_as_input_usage)
    }
}

fn map_io_as_input_usage(error: IoError) -> CommandError {
    CommandError::InputUsage(error.to_string())
}
