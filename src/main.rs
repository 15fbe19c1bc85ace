//! Simulta: run multiple commands simultaneously.
//!
//! This is the entry point of the application. It parses command-line
//! arguments, merges them with an optional `simulta.toml`, runs the commands
//! and turns the verdict into an exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::debug;

use simulta::config::{self, Config, Overrides};
use simulta::logging::{self, LogLevel};
use simulta::{FramingPolicy, Verdict};

/// Command-line interface definition.
#[derive(Debug, Parser)]
#[command(
    name = "simulta",
    version,
    about = "Run multiple commands simultaneously"
)]
struct Cli {
    /// Prefix each line with the command's index, or its name if --names is used.
    #[arg(long)]
    prefix: bool,
    /// Comma-separated names for the commands (e.g. "api,web").
    #[arg(long)]
    names: Option<String>,
    /// How output is cut into units ("line" or "chunk").
    #[arg(long, value_enum)]
    framing: Option<FramingPolicy>,
    /// Remove ANSI escape codes from command output.
    #[arg(long)]
    strip_ansi: bool,
    /// Shell used to run commands (defaults to $SHELL, then sh).
    #[arg(long)]
    shell: Option<String>,
    /// Path to simulta.toml configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ignore any simulta.toml in the current directory.
    #[arg(long)]
    no_config: bool,
    /// Diagnostic log level (overrides SIMULTA_LOG).
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
    /// Commands to run, each interpreted by the shell.
    #[arg(value_name = "COMMAND")]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level)?;

    let config = load_config(&cli)?;
    let request = config.into_request(Overrides {
        commands: cli.commands.clone(),
        names: cli.names.as_deref().map(parse_names),
        prefix: cli.prefix,
        framing: cli.framing,
        strip_ansi: cli.strip_ansi,
        shell: cli.shell.clone(),
    });

    if request.commands.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::SUCCESS);
    }

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let verdict = simulta::run(&request, &mut stdout, &mut stderr).await;
    debug!(?verdict, "run finished");

    match verdict {
        Verdict::Success => Ok(ExitCode::SUCCESS),
        Verdict::Failure { error } => {
            if let Some(error) = error {
                eprintln!("{}", error);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    if cli.no_config {
        return Ok(Config::default());
    }
    match config::find_config(cli.config.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            config::load_config(&path)
        }
        None => Ok(Config::default()),
    }
}

fn parse_names(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}
