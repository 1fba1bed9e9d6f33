//! logstyle CLI tool.
//!
//! Usage:
//! ```bash
//! logstyle [OPTIONS] [DIR]
//! logstyle [OPTIONS] DIR/...
//! logstyle list-rules
//! logstyle init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Checks that zap logging calls use constant messages
#[derive(Parser)]
#[command(name = "logstyle")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Package directory to analyze; `DIR/...` analyzes every package below DIR
    #[arg(default_value = ".")]
    dir: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Only run specific rules (comma-separated names or codes)
    #[arg(long)]
    rules: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One `file:line:column: message` line per violation.
    #[default]
    Text,
    /// A JSON document with every violation.
    Json,
    /// Annotated source snippets.
    Pretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}.");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the run completed but crossed `fail_on`.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        None => {
            let target = commands::check::Target::parse(&cli.dir);
            let source = config_resolver::resolve(target.root(), cli.config.as_deref());
            let options = commands::check::Options {
                format: cli.format,
                rules: cli.rules,
            };
            let outcome = commands::check::run(&target, &options, &source, std::io::stdout())?;
            Ok(!outcome.failed)
        }
        Some(Commands::ListRules) => {
            let source = config_resolver::resolve(Path::new("."), cli.config.as_deref());
            commands::list_rules::run(&source)?;
            Ok(true)
        }
        Some(Commands::Init { force }) => {
            commands::init::run(force)?;
            Ok(true)
        }
    }
}
