//! Registration phase of the data-extension repository.
//!
//! Discovery may run on several workers at once (one per plugin catalog, say),
//! so the builder only exposes insertion through `&self` and is backed by
//! concurrent maps. Nothing can be read back until
//! [`finalize_data_extensions`](DataExtensionRepositoryBuilder::finalize_data_extensions)
//! consumes it into an immutable [`DataExtensionRepository`].

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};
use uuid::Uuid;

use super::DataExtensionRepository;
use super::extension::{
    DataExtension, DataExtensionId, DataExtensionReference, DataProcessorDescriptor,
    DataProcessorId, TableDescriptor,
};
use super::resolution::{DeclaredRequirements, process_dependencies};
use crate::cookers::{DataCookerDescriptor, DataCookerPath, SourceDataCookerDescriptor};

/// Concurrent registry of extensions awaiting dependency resolution.
#[derive(Debug, Default)]
pub struct DataExtensionRepositoryBuilder {
    source_data_cookers: DashMap<DataCookerPath, Arc<dyn SourceDataCookerDescriptor>>,
    composite_data_cookers: DashMap<DataCookerPath, Arc<dyn DataCookerDescriptor>>,
    tables: DashMap<Uuid, TableDescriptor>,
    data_processors: DashMap<DataProcessorId, DataProcessorDescriptor>,
}

impl DataExtensionRepositoryBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source cooker. Returns `false` if its path is taken or it is
    /// not bound to a source parser.
    pub fn add_source_data_cooker(&self, cooker: Arc<dyn SourceDataCookerDescriptor>) -> bool {
        let path = cooker.path().clone();
        if !path.is_source_data_cooker() {
            warn!("Ignoring source cooker '{path}' without a source parser id");
            return false;
        }
        insert_new(&self.source_data_cookers, path, cooker, "source cooker")
    }

    /// Register a composite cooker. Returns `false` if its path is taken or it
    /// names a source parser.
    pub fn add_composite_data_cooker(&self, cooker: Arc<dyn DataCookerDescriptor>) -> bool {
        let path = cooker.path().clone();
        if !path.is_composite_data_cooker() {
            warn!("Ignoring composite cooker '{path}' bound to a source parser");
            return false;
        }
        insert_new(&self.composite_data_cookers, path, cooker, "composite cooker")
    }

    /// Register a table. Returns `false` if its id is taken.
    pub fn add_table(&self, table: TableDescriptor) -> bool {
        insert_new(&self.tables, table.id, table, "table")
    }

    /// Register a data processor. Returns `false` if its id is taken.
    pub fn add_data_processor(&self, processor: DataProcessorDescriptor) -> bool {
        insert_new(&self.data_processors, processor.id.clone(), processor, "data processor")
    }

    /// Number of registered extensions of every kind.
    pub fn len(&self) -> usize {
        self.source_data_cookers.len()
            + self.composite_data_cookers.len()
            + self.tables.len()
            + self.data_processors.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve every extension's dependencies and freeze the repository.
    ///
    /// Each extension ends up available or in error; errors are recorded on
    /// the extension and never abort finalization.
    pub fn finalize_data_extensions(self) -> DataExtensionRepository {
        let mut source_data_cookers: BTreeMap<_, _> = self
            .source_data_cookers
            .into_iter()
            .map(|(path, cooker)| (path, DataExtensionReference::new(cooker)))
            .collect();
        let mut composite_data_cookers: BTreeMap<_, _> = self
            .composite_data_cookers
            .into_iter()
            .map(|(path, cooker)| (path, DataExtensionReference::new(cooker)))
            .collect();
        let mut tables_by_id: BTreeMap<_, _> = self
            .tables
            .into_iter()
            .map(|(id, table)| (id, DataExtensionReference::new(table)))
            .collect();
        let mut data_processors: BTreeMap<_, _> = self
            .data_processors
            .into_iter()
            .map(|(id, processor)| (id, DataExtensionReference::new(processor)))
            .collect();

        let mut resolved = {
            let mut declared = BTreeMap::new();
            declare(&mut declared, source_data_cookers.values().map(|r| r.descriptor()));
            declare(&mut declared, composite_data_cookers.values().map(|r| r.descriptor()));
            declare(&mut declared, tables_by_id.values().map(|r| r.descriptor()));
            declare(&mut declared, data_processors.values().map(|r| r.descriptor()));
            process_dependencies(&declared)
        };

        let mut error_count = 0;
        let mut apply = |id: DataExtensionId| {
            let outcome = resolved.remove(&id).unwrap_or_default();
            if !outcome.errors.is_empty() {
                error_count += 1;
            }
            outcome
        };
        for reference in source_data_cookers.values_mut() {
            let outcome = apply(reference.extension_id());
            reference.resolve(outcome.errors, outcome.dependencies);
        }
        for reference in composite_data_cookers.values_mut() {
            let outcome = apply(reference.extension_id());
            reference.resolve(outcome.errors, outcome.dependencies);
        }
        for reference in tables_by_id.values_mut() {
            let outcome = apply(reference.extension_id());
            reference.resolve(outcome.errors, outcome.dependencies);
        }
        for reference in data_processors.values_mut() {
            let outcome = apply(reference.extension_id());
            reference.resolve(outcome.errors, outcome.dependencies);
        }

        let repository = DataExtensionRepository {
            source_data_cookers,
            composite_data_cookers,
            tables_by_id,
            data_processors,
        };
        info!(
            "Finalized {} data extension(s), {} in error",
            repository.extension_count(),
            error_count
        );
        repository
    }
}

fn insert_new<K, V>(map: &DashMap<K, V>, key: K, value: V, kind: &str) -> bool
where
    K: Eq + std::hash::Hash + std::fmt::Display,
{
    match map.entry(key) {
        Entry::Occupied(entry) => {
            warn!("Ignoring duplicate {kind} '{}'", entry.key());
            false
        }
        Entry::Vacant(entry) => {
            entry.insert(value);
            true
        }
    }
}

fn declare<'a, D: DataExtension + 'a>(
    declared: &mut BTreeMap<DataExtensionId, DeclaredRequirements<'a>>,
    descriptors: impl Iterator<Item = &'a D>,
) {
    for descriptor in descriptors {
        declared.insert(
            descriptor.extension_id(),
            DeclaredRequirements {
                cookers: descriptor.required_data_cookers(),
                processors: descriptor.required_data_processors(),
            },
        );
    }
}
