use std::io;
use std::path::PathBuf;
use std::process;

use apitester::adapters::xh::XhClient;
use apitester::cmd::catalog::CatalogTarget;
use apitester::cmd::data::DataOperation;
use apitester::cmd::template::TemplateKind;
use apitester::cmd::validate::ValidateTarget;
use apitester::cmd::{
    CommandResponse, r#assert, catalog, curl, data, run as run_cmd, template, token, validate,
};
use apitester::config::Settings;
use apitester::domain::endpoints::{DEFAULT_PAGE_NO, DEFAULT_PAGE_SIZE, Environment};
use apitester::domain::test_definition::{RequestMethod, RequestParams};
use apitester::io::Format;
use apitester::io::writer::write_value;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "APITESTER_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "apitester",
    version,
    about = "Assertion-driven tester for the MDM integration API"
)]
struct Cli {
    /// Settings file; defaults to $APITESTER_CONFIG or ./apitester.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target environment, overriding config and $APITESTER_ENV.
    #[arg(long, global = true, value_enum)]
    env: Option<CliEnvironment>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate assertion rules against a captured response body.
    Assert(AssertArgs),
    /// Exchange credentials for a bearer token.
    Token,
    /// GET an endpoint with pagination and period parameters.
    Fetch(FetchArgs),
    /// POST an upload payload to an entity endpoint.
    Upload(UploadArgs),
    /// Pricelist operations.
    #[command(subcommand)]
    Pricelist(PricelistCommand),
    /// Print the equivalent cURL command.
    Curl(CurlArgs),
    /// Describe endpoints, environments and upload schemas.
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Generate payload or test definition templates.
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Validate payloads or test files without sending anything.
    #[command(subcommand)]
    Validate(ValidateCommand),
    /// Run a test definition or suite file.
    Run(RunArgs),
}

#[derive(Debug, clap::Args)]
struct AssertArgs {
    #[arg(long)]
    rules: PathBuf,

    /// Response body file; stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum)]
    from: Option<CliFormat>,

    #[arg(long, default_value_t = 200)]
    status: i64,

    #[arg(long, default_value_t = 0.0)]
    time_ms: f64,
}

#[derive(Debug, Clone, clap::Args)]
struct PageArgs {
    #[arg(long)]
    page_size: Option<u32>,

    #[arg(long)]
    page_no: Option<u32>,

    #[arg(long)]
    period: Option<u32>,
}

impl From<PageArgs> for RequestParams {
    fn from(value: PageArgs) -> Self {
        Self {
            page_size: value.page_size,
            page_no: value.page_no,
            period: value.period,
        }
    }
}

#[derive(Debug, clap::Args)]
struct FetchArgs {
    endpoint: String,

    #[command(flatten)]
    page: PageArgs,
}

#[derive(Debug, clap::Args)]
struct UploadArgs {
    endpoint: String,

    #[arg(long)]
    payload: PathBuf,

    #[arg(long, default_value_t = false)]
    confirm: bool,
}

#[derive(Debug, Subcommand)]
enum PricelistCommand {
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        #[arg(long, default_value_t = DEFAULT_PAGE_NO)]
        page_no: u32,
    },
    Items {
        pricelist_id: String,
    },
    Update {
        #[arg(long)]
        payload: PathBuf,

        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

#[derive(Debug, clap::Args)]
struct CurlArgs {
    endpoint: String,

    #[arg(long, value_enum, default_value_t = CliMethod::Get)]
    method: CliMethod,

    #[command(flatten)]
    page: PageArgs,

    #[arg(long)]
    payload: Option<PathBuf>,

    /// Bearer token to embed instead of logging in.
    #[arg(long)]
    token: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    Endpoints,
    Environments,
    UploadSchemas,
    UploadSchema { endpoint: String },
}

#[derive(Debug, Subcommand)]
enum TemplateCommand {
    Payload {
        endpoint: String,

        #[arg(long, value_enum, default_value_t = CliFormat::Json)]
        to: CliFormat,
    },
    Test {
        endpoint: String,

        #[arg(long, value_enum, default_value_t = CliMethod::Get)]
        method: CliMethod,

        #[arg(long, value_enum, default_value_t = CliFormat::Json)]
        to: CliFormat,
    },
}

#[derive(Debug, Subcommand)]
enum ValidateCommand {
    Payload {
        endpoint: String,

        #[arg(long)]
        payload: PathBuf,
    },
    Test {
        file: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    file: PathBuf,

    /// Allow mutating tests that passed every guard to send their request.
    #[arg(long, default_value_t = false)]
    confirm: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliEnvironment {
    Qa,
    Prod,
}

impl From<CliEnvironment> for Environment {
    fn from(value: CliEnvironment) -> Self {
        match value {
            CliEnvironment::Qa => Self::Qa,
            CliEnvironment::Prod => Self::Prod,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliMethod {
    #[value(name = "GET", alias = "get")]
    Get,
    #[value(name = "POST", alias = "post")]
    Post,
}

impl From<CliMethod> for RequestMethod {
    fn from(value: CliMethod) -> Self {
        match value {
            CliMethod::Get => Self::Get,
            CliMethod::Post => Self::Post,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliFormat {
    Json,
    Yaml,
}

impl From<CliFormat> for Format {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Json => Self::Json,
            CliFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Serialize)]
struct CliError<'a> {
    error: &'a str,
    message: String,
    code: i32,
    details: Value,
}

fn main() {
    init_tracing();
    process::exit(run());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return handle_parse_error(error),
    };

    let environment = cli.env.map(Environment::from);
    let config = cli.config;
    let load = || load_settings(config.as_deref(), environment);

    match cli.command {
        Commands::Assert(args) => {
            let command_args = r#assert::AssertCommandArgs {
                rules: args.rules,
                input: args.input,
                from: args.from.map(Into::into),
                status_code: args.status,
                response_time_ms: args.time_ms,
            };
            let stdin = io::stdin();
            finish("assert", r#assert::run_with_stdin(&command_args, stdin.lock()))
        }
        Commands::Token => with_settings(load, "token", |settings, transport| {
            token::run(settings, transport)
        }),
        Commands::Fetch(args) => with_settings(load, "fetch", |settings, transport| {
            data::run(
                &DataOperation::Fetch {
                    endpoint: args.endpoint,
                    params: args.page.into(),
                },
                settings,
                transport,
            )
        }),
        Commands::Upload(args) => with_settings(load, "upload", |settings, transport| {
            data::run(
                &DataOperation::Upload {
                    endpoint: args.endpoint,
                    payload: args.payload,
                    confirm: args.confirm,
                },
                settings,
                transport,
            )
        }),
        Commands::Pricelist(command) => {
            let operation = match command {
                PricelistCommand::List { page_size, page_no } => {
                    DataOperation::PricelistList { page_size, page_no }
                }
                PricelistCommand::Items { pricelist_id } => {
                    DataOperation::PricelistItems { pricelist_id }
                }
                PricelistCommand::Update { payload, confirm } => {
                    DataOperation::PricelistUpdate { payload, confirm }
                }
            };
            with_settings(load, "pricelist", |settings, transport| {
                data::run(&operation, settings, transport)
            })
        }
        Commands::Curl(args) => with_settings(load, "curl", |settings, transport| {
            curl::run(
                &curl::CurlCommandArgs {
                    endpoint: args.endpoint,
                    method: args.method.into(),
                    params: args.page.into(),
                    payload: args.payload,
                    token: args.token,
                },
                settings,
                transport,
            )
        }),
        Commands::Catalog(command) => {
            let target = match command {
                CatalogCommand::Endpoints => CatalogTarget::Endpoints,
                CatalogCommand::Environments => CatalogTarget::Environments,
                CatalogCommand::UploadSchemas => CatalogTarget::UploadSchemas,
                CatalogCommand::UploadSchema { endpoint } => CatalogTarget::UploadSchema(endpoint),
            };
            with_settings(load, "catalog", |settings, _| catalog::run(&target, settings))
        }
        Commands::Template(command) => {
            let (kind, to) = match command {
                TemplateCommand::Payload { endpoint, to } => {
                    (TemplateKind::Payload { endpoint }, to)
                }
                TemplateCommand::Test {
                    endpoint,
                    method,
                    to,
                } => (
                    TemplateKind::Test {
                        endpoint,
                        method: method.into(),
                    },
                    to,
                ),
            };
            finish_as("template", template::run(&kind), to.into())
        }
        Commands::Validate(command) => {
            let target = match command {
                ValidateCommand::Payload { endpoint, payload } => ValidateTarget::Payload {
                    endpoint,
                    file: payload,
                },
                ValidateCommand::Test { file } => ValidateTarget::Test { file },
            };
            finish("validate", validate::run(&target))
        }
        Commands::Run(args) => with_settings(load, "run", |settings, transport| {
            run_cmd::run(
                &run_cmd::RunCommandArgs {
                    file: args.file,
                    confirm: args.confirm,
                },
                settings,
                transport,
            )
        }),
    }
}

fn load_settings(
    config: Option<&std::path::Path>,
    environment: Option<Environment>,
) -> Result<Settings, String> {
    Settings::load(config)
        .map(|settings| settings.with_environment(environment))
        .map_err(|error| error.to_string())
}

fn with_settings<L, F>(load: L, command: &'static str, execute: F) -> i32
where
    L: FnOnce() -> Result<Settings, String>,
    F: FnOnce(&Settings, &XhClient) -> CommandResponse,
{
    match load() {
        Ok(settings) => {
            let transport = settings.transport();
            finish(command, execute(&settings, &transport))
        }
        Err(message) => {
            emit_error(
                "input_usage_error",
                message,
                json!({"command": command, "kind": "config_error"}),
                3,
            );
            3
        }
    }
}

fn handle_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{error}");
            0
        }
        _ => {
            emit_error(
                "input_usage_error",
                error.to_string(),
                json!({"kind": "cli_parse_error"}),
                3,
            );
            3
        }
    }
}

fn finish(command: &'static str, response: CommandResponse) -> i32 {
    finish_as(command, response, Format::Json)
}

/// Reports go to stdout, error envelopes to stderr.
fn finish_as(command: &'static str, response: CommandResponse, format: Format) -> i32 {
    match response.exit_code {
        0 | 2 => {
            let stdout = io::stdout();
            if emit_stdout(&response.payload, format, stdout.lock()) {
                response.exit_code
            } else {
                emit_error(
                    "internal_error",
                    format!("failed to write {command} response"),
                    json!({"command": command}),
                    1,
                );
                1
            }
        }
        3 | 1 => {
            if emit_json_stderr(&response.payload) {
                response.exit_code
            } else {
                emit_error(
                    "internal_error",
                    format!("failed to serialize {command} error"),
                    json!({"command": command}),
                    1,
                );
                1
            }
        }
        other => {
            emit_error(
                "internal_error",
                format!("unexpected {command} exit code: {other}"),
                json!({"command": command}),
                1,
            );
            1
        }
    }
}

fn emit_stdout<W: io::Write>(value: &Value, format: Format, writer: W) -> bool {
    write_value(writer, format, value).is_ok()
}

fn emit_json_stderr(value: &Value) -> bool {
    match serde_json::to_string(value) {
        Ok(serialized) => {
            eprintln!("{serialized}");
            true
        }
        Err(_) => false,
    }
}

fn emit_error(error: &'static str, message: String, details: Value, code: i32) {
    let payload = CliError {
        error,
        message,
        code,
        details,
    };
    match serde_json::to_string(&payload) {
        Ok(serialized) => eprintln!("{serialized}"),
        Err(_) => eprintln!(
            "{{\"error\":\"internal_error\",\"message\":\"failed to serialize error\",\"code\":1}}"
        ),
    }
}
