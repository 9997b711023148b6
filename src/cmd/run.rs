use std::path::PathBuf;

use serde_json::json;

use crate::adapters::xh::Transport;
use crate::cmd::{CommandError, CommandResponse, respond};
use crate::config::Settings;
use crate::engine::runner::{RunError, RunOptions, Runner};
use crate::engine::suite::{SuiteError, TestDocument, parse_document};
use crate::io;

#[derive(Debug, Clone)]
pub struct RunCommandArgs {
    pub file: PathBuf,
    pub confirm: bool,
}

/// Runs a test or suite file. Exit 0 when everything passed, 2 otherwise.
pub fn run(args: &RunCommandArgs, settings: &Settings, transport: &dyn Transport) -> CommandResponse {
    respond(execute(args, settings, transport))
}

fn execute(
    args: &RunCommandArgs,
    settings: &Settings,
    transport: &dyn Transport,
) -> Result<CommandResponse, CommandError> {
    let document = io::reader::read_path(&args.file)
        .map_err(|error| CommandError::InputUsage(error.to_string()))?;
    let document = parse_document(&document).map_err(|error| match error {
        SuiteError::Invalid { errors } => CommandError::InputUsageWithDetails(
            format!("invalid test file `{}`", args.file.display()),
            json!({ "errors": errors }),
        ),
        SuiteError::Internal(message) => CommandError::Internal(message),
    })?;

    let mut runner = Runner::new(
        transport,
        settings,
        RunOptions {
            confirm: args.confirm,
        },
    );
    match document {
        TestDocument::Single(test) => {
            let report = runner.run_test(&test).map_err(map_run_error)?;
            Ok(CommandResponse::report(&report, report.passed))
        }
        TestDocument::Suite(suite) => {
            let report = runner.run_suite(&suite);
            Ok(CommandResponse::report(&report, report.failed == 0))
        }
    }
}

fn map_run_error(error: RunError) -> CommandError {
    match error {
        RunError::ConfirmationRequired(confirmation) => CommandError::InputUsageWithDetails(
            format!("{} Re-run with --confirm to proceed.", confirmation.warning),
            json!({ "confirmation": confirmation }),
        ),
        other => CommandError::InputUsage(other.to_string()),
    }
}
