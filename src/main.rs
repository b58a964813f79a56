//! bigrig CLI
//!
//! Prints a structured metrics report for an analyzed browser
//! performance trace, optionally with allocator dump sizes folded in.

use anyhow::Result;
use bigrig::commands::{display_version, execute_report, validate_args, ReportArgs};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

/// bigrig - metrics reports for browser performance traces
#[derive(Parser, Debug)]
#[command(name = "bigrig")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the metrics report for an analyzed trace
    Report {
        /// The analyzed trace results to be reported (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Pretty print the results
        #[arg(long, visible_alias = "pp")]
        pretty_print: bool,

        /// Allocator dump snapshot whose sizes are added under "memory"
        #[arg(short, long)]
        memory: Option<PathBuf>,

        /// Render layout configuration (TOML)
        #[arg(short, long, env = "BIGRIG_CONFIG")]
        config: Option<PathBuf>,

        /// Fail on the first malformed snapshot record instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Report {
            file,
            pretty_print,
            memory,
            config,
            strict,
        } => {
            let args = ReportArgs {
                file,
                pretty_print,
                memory,
                config,
                strict,
            };

            validate_args(&args)?;
            execute_report(args)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
