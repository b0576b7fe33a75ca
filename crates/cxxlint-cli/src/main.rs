//! cxxlint CLI tool.
//!
//! Usage:
//! ```bash
//! cxxlint check [OPTIONS] [PATH]...
//! cxxlint list-rules
//! cxxlint init
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Convention linter for C++ sources
#[derive(Parser)]
#[command(name = "cxxlint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run lint checks
    Check {
        /// Files or directories to analyze (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Apply automatic fixes in place
        #[arg(long)]
        fix: bool,

        /// Output format (default: from config, else text)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Exit with 1 when error-severity violations remain
        #[arg(long, value_name = "BOOL")]
        fail_on_error: Option<bool>,

        /// Only run specific rules (comma-separated names or codes)
        #[arg(long)]
        rules: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Whole-run timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per violation.
    Text,
    /// JSON array of violation records.
    Json,
    /// Source snippets with labels.
    Pretty,
}

impl From<OutputFormat> for cxxlint_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
            OutputFormat::Pretty => Self::Pretty,
        }
    }
}

/// Exit code for failures not attributable to any file.
const ENGINE_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Check {
            paths,
            fix,
            format,
            fail_on_error,
            rules,
            exclude,
            jobs,
            timeout,
        } => {
            let options = commands::check::CheckOptions {
                paths,
                fix,
                format: format.map(Into::into),
                fail_on_error,
                rules,
                exclude,
                jobs,
                timeout,
            };
            commands::check::run(&options, cli.config.as_deref()).map(|s| s.exit_code())
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(0)
        }
        Commands::Init { force } => commands::init::run(force).map(|()| 0),
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(ENGINE_ERROR)
        }
    }
}
