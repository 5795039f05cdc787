//! Plan source passes for a table or cooker selection.
//!
//! One processing session is opened per source parser found in the catalogs.
//! Selected tables and cookers are enabled across the sessions, and every
//! session with at least one enabled cooker is scheduled. A scheduling error
//! aborts the command: it means a catalog describes an impossible plan.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use uuid::Uuid;

use super::common::{OutputFormat, load_repository};
use crate::cookers::DataCookerPath;
use crate::core::TracecookError;
use crate::repository::{
    DataExtensionLookup, DataExtensionRepository, SourceDataProcessor, TableSelection, enable_data_cookers,
    enable_source_data_cookers_for_tables, get_enabled_table_extension_references,
    sessions_for_repository,
};
use crate::scheduler::Placement;

/// `tracecook schedule`
#[derive(Debug, Args)]
pub struct ScheduleCommand {
    /// Extension catalogs to load (defaults to TRACECOOK_CATALOG_PATH)
    catalogs: Vec<PathBuf>,

    /// Enable the table with this GUID (repeatable)
    #[arg(long = "table", value_name = "GUID")]
    tables: Vec<Uuid>,

    /// Enable every available table
    #[arg(long, conflicts_with = "tables")]
    all_tables: bool,

    /// Enable the cooker at this path, e.g. `LTTng/Threads` or `/CpuUsage` (repeatable)
    #[arg(long = "cooker", value_name = "PATH")]
    cookers: Vec<DataCookerPath>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Tables enabled for the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnabledTable {
    /// Table GUID
    pub id: Uuid,
    /// Display name
    pub name: String,
}

/// Pass plan of one source parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSchedule {
    /// Source parser id
    pub source_parser_id: String,
    /// Cooker paths per pass, in block order
    pub passes: Vec<Vec<String>>,
    /// Every placement of every scheduled cooker
    pub placements: BTreeMap<String, Vec<Placement>>,
}

/// Full output of the command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    /// Tables that were enabled
    pub tables: Vec<EnabledTable>,
    /// Plans of sources with enabled cookers, ordered by source parser id
    pub sources: Vec<SourceSchedule>,
}

impl ScheduleCommand {
    /// Run the command.
    ///
    /// # Errors
    ///
    /// Fails if catalogs cannot be loaded or a source cannot be scheduled.
    pub async fn execute(self) -> Result<()> {
        let repository = load_repository(&self.catalogs).await?;
        let report = build_report(&repository, self.table_selection().as_ref(), &self.cookers)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => print_text(&report),
        }
        Ok(())
    }

    /// Tables to enable. Without any selection flag every table is enabled;
    /// with only `--cooker`, none are.
    fn table_selection(&self) -> Option<TableSelection> {
        if self.all_tables {
            Some(TableSelection::All)
        } else if !self.tables.is_empty() {
            Some(TableSelection::only(self.tables.iter().copied()))
        } else if self.cookers.is_empty() {
            Some(TableSelection::All)
        } else {
            None
        }
    }
}

/// Enable `selection` and `cookers` on fresh sessions and schedule each source.
///
/// # Errors
///
/// Fails with [`TracecookError::ExtensionNotFound`] if a named table or cooker
/// is not registered at all, and otherwise returns the first scheduling error
/// with the source parser id as context.
pub fn build_report(
    repository: &DataExtensionRepository,
    selection: Option<&TableSelection>,
    cookers: &[DataCookerPath],
) -> Result<ScheduleReport> {
    ensure_registered(repository, selection, cookers)?;

    let mut sessions = sessions_for_repository(repository);
    let mut report = ScheduleReport::default();

    if let Some(selection) = selection {
        let tables = get_enabled_table_extension_references(repository, &sessions, selection);
        report.tables = tables
            .iter()
            .map(|table| EnabledTable {
                id: table.descriptor().id,
                name: table.descriptor().name.clone(),
            })
            .collect();
        enable_source_data_cookers_for_tables(repository, &mut sessions, &tables);
    }
    enable_data_cookers(repository, &mut sessions, cookers);

    for session in sessions.iter().filter(|session| !session.enabled_data_cookers().is_empty()) {
        let source_parser_id = session.source_parser_id();
        let scheduler = session
            .build_schedule()
            .with_context(|| format!("Failed to schedule source parser '{source_parser_id}'"))?;

        let passes = scheduler
            .data_cookers_by_source_pass()
            .iter()
            .map(|pass| pass.iter().map(|cooker| cooker.path().to_string()).collect())
            .collect();
        let placements = session
            .enabled_data_cookers()
            .iter()
            .map(|cooker| {
                let path = cooker.path();
                (path.to_string(), scheduler.placements(path).to_vec())
            })
            .collect();

        report.sources.push(SourceSchedule {
            source_parser_id: source_parser_id.to_string(),
            passes,
            placements,
        });
    }

    Ok(report)
}

// Registered but unavailable extensions are skipped later on; unknown ones
// are most likely typos on the command line.
fn ensure_registered(
    repository: &DataExtensionRepository,
    selection: Option<&TableSelection>,
    cookers: &[DataCookerPath],
) -> Result<(), TracecookError> {
    if let Some(TableSelection::Only(ids)) = selection
        && let Some(id) = ids.iter().find(|id| repository.get_table(id).is_none())
    {
        return Err(TracecookError::ExtensionNotFound {
            id: id.to_string(),
        });
    }

    let is_registered = |path: &DataCookerPath| {
        if path.is_composite_data_cooker() {
            repository.get_composite_data_cooker(path).is_some()
        } else {
            repository.get_source_data_cooker(path).is_some()
        }
    };
    if let Some(path) = cookers.iter().find(|path| !is_registered(path)) {
        return Err(TracecookError::ExtensionNotFound {
            id: path.to_string(),
        });
    }

    Ok(())
}

fn print_text(report: &ScheduleReport) {
    if !report.tables.is_empty() {
        println!("{}", "Enabled tables:".bold());
        for table in &report.tables {
            println!("  {} ({})", table.name, table.id.to_string().dimmed());
        }
        println!();
    }

    if report.sources.is_empty() {
        println!("{}", "No data cookers enabled".yellow());
        return;
    }

    for source in &report.sources {
        println!(
            "{} {}",
            format!("Source parser '{}':", source.source_parser_id).bold(),
            format!("{} pass(es)", source.passes.len()).cyan()
        );
        for (index, pass) in source.passes.iter().enumerate() {
            println!("  Pass {index}: {}", pass.join(", "));
        }
    }
}
