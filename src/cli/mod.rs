//! Command-line interface for tracecook.
//!
//! The CLI loads extension catalogs into a repository and exercises the two
//! things a trace processor does with it at startup: checking which extensions
//! are usable, and planning how many passes each source needs.
//!
//! # Commands
//!
//! - `validate` - Resolve every extension's dependencies and report errors
//! - `schedule` - Enable tables or cookers and print the per-source pass plan
//!
//! # Examples
//!
//! ```bash
//! # Check a set of catalogs
//! tracecook validate lttng.toml etw.toml
//!
//! # Plan passes for every available table
//! tracecook schedule lttng.toml --all-tables
//!
//! # Plan passes for one table, as JSON
//! tracecook schedule lttng.toml --table 6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d11 --format json
//!
//! # Catalogs from the environment
//! TRACECOOK_CATALOG_PATH=lttng.toml tracecook schedule --cooker LTTng/ContextSwitches
//! ```
//!
//! # Global Options
//!
//! - `--verbose` / `-v`: debug logging
//! - `--quiet` / `-q`: no logging
//!
//! Without either, `RUST_LOG` is honored and defaults to `info`. Logs go to
//! stderr so command output stays machine-readable.

mod common;
pub mod schedule;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use common::OutputFormat;

/// Settings derived from global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter to install; `None` disables logging.
    pub log_level: Option<String>,
    /// Whether the filter came from `--verbose` and overrides `RUST_LOG`.
    pub force_level: bool,
}

impl CliConfig {
    /// Install the global tracing subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = if !self.force_level && std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(level)
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure.
#[derive(Debug, Parser)]
#[command(
    name = "tracecook",
    about = "Plan source data cooker passes for trace processing",
    version,
    long_about = "tracecook resolves data extensions declared in TOML catalogs and schedules \
                  the source cookers each table needs into the fewest passes over the source."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve extension dependencies and report availability
    Validate(validate::ValidateCommand),

    /// Enable tables or cookers and print the pass schedule per source parser
    Schedule(schedule::ScheduleCommand),
}

impl Cli {
    /// Run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error; `main` renders it with suggestions.
    pub async fn execute(self) -> Result<()> {
        self.build_config().init_logging();

        match self.command {
            Commands::Validate(cmd) => cmd.execute().await,
            Commands::Schedule(cmd) => cmd.execute().await,
        }
    }

    /// Derive logging settings from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            force_level: self.verbose,
        }
    }
}
