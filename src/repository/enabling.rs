//! Enabling helpers: from a table selection to per-source cooker sets.
//!
//! A table is enabled only when it resolved as available and every source
//! parser its cookers read from is being processed. Enabling walks required
//! cookers depth-first, requirements before dependents, and hands each source
//! cooker to the processor of its source parser. Extensions in error are
//! skipped with a warning; nothing in this module fails.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::DataExtensionLookup;
use super::extension::TableExtensionReference;
use crate::cookers::{DataCookerPath, SourceDataCookerDescriptor};

/// Something that runs source cookers over one source parser's output.
pub trait SourceDataProcessor {
    /// Id of the source parser this processor drives.
    fn source_parser_id(&self) -> &str;

    /// Enable `cooker`. Returns `false` if it was already enabled or belongs to
    /// another source parser.
    fn enable_data_cooker(&mut self, cooker: Arc<dyn SourceDataCookerDescriptor>) -> bool;

    /// Whether the cooker at `path` is enabled.
    fn is_data_cooker_enabled(&self, path: &DataCookerPath) -> bool;
}

/// Which tables the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableSelection {
    /// Every registered table
    #[default]
    All,
    /// Only tables with these ids
    Only(BTreeSet<Uuid>),
}

impl TableSelection {
    /// Select the given table ids.
    pub fn only(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self::Only(ids.into_iter().collect())
    }
}

/// Tables from `selection` that can be produced by `processors`.
///
/// A table qualifies when it is available and all source parsers in its
/// transitive requirements are among the processors' source parsers. Unknown
/// ids are logged and skipped. Result is ordered by table id.
pub fn get_enabled_table_extension_references<'r, R, P>(
    repository: &'r R,
    processors: &[P],
    selection: &TableSelection,
) -> Vec<&'r TableExtensionReference>
where
    R: DataExtensionLookup,
    P: SourceDataProcessor,
{
    let available_sources: BTreeSet<&str> =
        processors.iter().map(SourceDataProcessor::source_parser_id).collect();

    let candidates: Vec<&TableExtensionReference> = match selection {
        TableSelection::All => repository.tables_by_id().values().collect(),
        TableSelection::Only(ids) => ids
            .iter()
            .filter_map(|id| {
                let table = repository.get_table(id);
                if table.is_none() {
                    warn!("Table '{id}' is not registered");
                }
                table
            })
            .collect(),
    };

    candidates
        .into_iter()
        .filter(|table| {
            let name = &table.descriptor().name;
            if !table.is_available() {
                warn!("Skipping table '{name}': {}", table.errors().join("; "));
                return false;
            }
            let missing: Vec<&str> = table
                .dependencies()
                .required_source_parsers()
                .into_iter()
                .filter(|source| !available_sources.contains(source))
                .collect();
            if !missing.is_empty() {
                debug!("Skipping table '{name}': no processor for {}", missing.join(", "));
                return false;
            }
            true
        })
        .collect()
}

/// Enable every source cooker the given tables need, directly or through
/// composite cookers and data processors.
///
/// Returns the paths of the source cookers enabled by this call.
pub fn enable_source_data_cookers_for_tables<R, P>(
    repository: &R,
    processors: &mut [P],
    tables: &[&TableExtensionReference],
) -> BTreeSet<DataCookerPath>
where
    R: DataExtensionLookup,
    P: SourceDataProcessor,
{
    let mut required: Vec<DataCookerPath> = Vec::new();
    for table in tables {
        required.extend(table.required_data_cookers().iter().cloned());
        for processor_id in &table.dependencies().data_processors {
            if let Some(processor) = repository.get_data_processor(processor_id) {
                required.extend(processor.required_data_cookers().iter().cloned());
            }
        }
    }
    enable_data_cookers(repository, processors, &required)
}

/// Enable the cookers at `paths` and, transitively, the cookers they require.
///
/// Composite paths are followed through to the source cookers underneath.
/// Returns the paths of the source cookers enabled by this call.
pub fn enable_data_cookers<R, P>(
    repository: &R,
    processors: &mut [P],
    paths: &[DataCookerPath],
) -> BTreeSet<DataCookerPath>
where
    R: DataExtensionLookup,
    P: SourceDataProcessor,
{
    let mut walk = EnableWalk {
        repository,
        processors,
        visited: BTreeSet::new(),
        enabled: BTreeSet::new(),
    };
    for path in paths {
        walk.enable(path);
    }
    walk.enabled
}

struct EnableWalk<'a, R, P> {
    repository: &'a R,
    processors: &'a mut [P],
    visited: BTreeSet<DataCookerPath>,
    enabled: BTreeSet<DataCookerPath>,
}

impl<R: DataExtensionLookup, P: SourceDataProcessor> EnableWalk<'_, R, P> {
    fn enable(&mut self, path: &DataCookerPath) {
        if !self.visited.insert(path.clone()) {
            return;
        }
        let repository = self.repository;

        if path.is_composite_data_cooker() {
            let Some(reference) = repository.get_composite_data_cooker(path) else {
                warn!("Composite cooker '{path}' is not registered");
                return;
            };
            if !reference.is_available() {
                warn!("Skipping composite cooker '{path}': {}", reference.errors().join("; "));
                return;
            }
            for required in reference.required_data_cookers() {
                self.enable(required);
            }
            return;
        }

        let Some(reference) = repository.get_source_data_cooker(path) else {
            warn!("Source cooker '{path}' is not registered");
            return;
        };
        if !reference.is_available() {
            warn!("Skipping source cooker '{path}': {}", reference.errors().join("; "));
            return;
        }
        let Some(index) = self
            .processors
            .iter()
            .position(|processor| processor.source_parser_id() == path.source_parser_id())
        else {
            debug!(
                "No processor for source parser '{}', not enabling '{path}'",
                path.source_parser_id()
            );
            return;
        };

        for required in reference.required_data_cookers() {
            self.enable(required);
        }

        let processor = &mut self.processors[index];
        if processor.enable_data_cooker(Arc::clone(reference.descriptor())) {
            debug!("Enabled '{path}'");
            self.enabled.insert(path.clone());
        }
    }
}
