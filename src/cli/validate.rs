//! Report the availability of every extension in a set of catalogs.
//!
//! Loading fails fast on unreadable or malformed catalogs. Dependency problems
//! do not: every extension is resolved and listed, and the command exits with
//! an error only after the full report has been printed.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::common::{OutputFormat, load_repository};
use crate::repository::{DataExtensionAvailability, ExtensionStatus};

/// `tracecook validate`
#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Extension catalogs to load (defaults to TRACECOOK_CATALOG_PATH)
    catalogs: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Machine-readable validation result.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    /// Whether every extension is available
    pub valid: bool,
    /// Number of available extensions
    pub available: usize,
    /// Number of extensions in error
    pub errors: usize,
    /// Every extension's status
    pub extensions: Vec<ExtensionStatus>,
}

impl ValidationReport {
    /// Summarize `extensions`.
    pub fn new(extensions: Vec<ExtensionStatus>) -> Self {
        let errors = extensions
            .iter()
            .filter(|status| status.availability == DataExtensionAvailability::Error)
            .count();
        Self {
            valid: errors == 0,
            available: extensions.len() - errors,
            errors,
            extensions,
        }
    }
}

impl ValidateCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails if catalogs cannot be loaded or any extension is in error.
    pub async fn execute(self) -> Result<()> {
        let repository = load_repository(&self.catalogs).await?;
        let report = ValidationReport::new(repository.extension_statuses());

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report),
        }

        if !report.valid {
            bail!("{} data extension(s) failed dependency resolution", report.errors);
        }
        Ok(())
    }
}

fn print_text(report: &ValidationReport) {
    for status in &report.extensions {
        let label = match &status.name {
            Some(name) => format!("{} {} ({name})", status.kind, status.id),
            None => format!("{} {}", status.kind, status.id),
        };
        if status.availability == DataExtensionAvailability::Error {
            println!("{} {label}", "✗".red());
            for error in &status.errors {
                println!("    {}", error.dimmed());
            }
        } else {
            println!("{} {label}", "✓".green());
        }
    }

    println!();
    let summary = format!(
        "{} extension(s): {} available, {} in error",
        report.extensions.len(),
        report.available,
        report.errors
    );
    if report.valid {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}
