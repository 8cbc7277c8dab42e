// crates/taryahan-cli/src/main.rs
// ============================================================================
// Module: Taryahan CLI Entry Point
// Description: Command dispatcher for the Taryahan community service.
// Purpose: Run the HTTP server, validate configuration, and report statistics.
// Dependencies: clap, taryahan-config, taryahan-server, thiserror, tokio,
//               tracing-subscriber
// ============================================================================

//! ## Overview
//! The `taryahan` binary loads configuration (from `--config`, the
//! `TARYAHAN_CONFIG` environment variable, or `taryahan.toml`) and either
//! serves the HTTP API, validates the file, prints an example, or prints
//! statistics for one resource. Operational logs go to stderr through
//! `tracing`; command output goes to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use taryahan_cli::stats::StatsTarget;
use taryahan_cli::stats::collect_stats;
use taryahan_config::TaryahanConfig;
use taryahan_config::config_toml_example;
use taryahan_core::Timestamp;
use taryahan_server::TaryahanServer;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "taryahan", version, about = "Taryahan community service")]
struct Cli {
    /// Command to run.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Print statistics for one resource.
    Stats(StatsCommand),
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigValidateCommand),
    /// Print a complete example config.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `stats`.
#[derive(Args, Debug)]
struct StatsCommand {
    /// Resource to aggregate.
    #[arg(value_enum)]
    resource: StatsTarget,
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self { message }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config { command } => command_config(command),
        Commands::Stats(command) => command_stats(&command),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config)?;
    let server = TaryahanServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            let _config = load_config(command.config)?;
            write_stdout_line("config ok")?;
        }
        ConfigCommand::Example => write_stdout_line(config_toml_example().trim_end())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `stats` command.
fn command_stats(command: &StatsCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.clone())?;
    tracing::info!(resource = command.resource.kind().as_str(), "computing statistics");
    let stats = collect_stats(&config.store, command.resource, Timestamp::now())
        .map_err(|err| CliError::new(format!("statistics failed: {err}")))?;
    let rendered = serde_json::to_string_pretty(&stats)
        .map_err(|err| CliError::new(format!("failed to render statistics: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(path: Option<PathBuf>) -> CliResult<TaryahanConfig> {
    TaryahanConfig::load(path.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
