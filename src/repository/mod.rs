//! Data-extension repository.
//!
//! Extensions are discovered into a [`DataExtensionRepositoryBuilder`], which
//! accepts registrations from any number of threads. Finalizing the builder
//! resolves every extension's dependencies and yields a read-only
//! [`DataExtensionRepository`]:
//!
//! ```text
//! discover ──► DataExtensionRepositoryBuilder ──finalize──► DataExtensionRepository
//!  (catalogs)        (concurrent inserts)                     (immutable lookups)
//! ```
//!
//! The [`enabling`] helpers then walk a finalized repository to decide which
//! source cookers each source processor must run for a table selection.

pub mod builder;
pub mod enabling;
pub mod extension;
mod resolution;
pub mod session;

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

pub use builder::DataExtensionRepositoryBuilder;
pub use enabling::{
    SourceDataProcessor, TableSelection, enable_data_cookers, enable_source_data_cookers_for_tables,
    get_enabled_table_extension_references,
};
pub use extension::{
    CompositeDataCookerReference, DataExtension, DataExtensionAvailability,
    DataExtensionDependencies, DataExtensionId, DataExtensionReference, DataProcessorDescriptor,
    DataProcessorId, DataProcessorReference, SourceDataCookerReference, TableDescriptor,
    TableExtensionReference,
};
pub use session::{SourceProcessingSession, sessions_for_repository};

use crate::cookers::DataCookerPath;

/// Read access to finalized extensions.
pub trait DataExtensionLookup {
    /// All source cookers by path.
    fn source_data_cookers(&self) -> &BTreeMap<DataCookerPath, SourceDataCookerReference>;

    /// All composite cookers by path.
    fn composite_data_cookers(&self) -> &BTreeMap<DataCookerPath, CompositeDataCookerReference>;

    /// All tables by id.
    fn tables_by_id(&self) -> &BTreeMap<Uuid, TableExtensionReference>;

    /// All data processors by id.
    fn data_processors(&self) -> &BTreeMap<DataProcessorId, DataProcessorReference>;

    /// Source cooker at `path`, if registered.
    fn get_source_data_cooker(&self, path: &DataCookerPath) -> Option<&SourceDataCookerReference> {
        self.source_data_cookers().get(path)
    }

    /// Composite cooker at `path`, if registered.
    fn get_composite_data_cooker(
        &self,
        path: &DataCookerPath,
    ) -> Option<&CompositeDataCookerReference> {
        self.composite_data_cookers().get(path)
    }

    /// Table with `id`, if registered.
    fn get_table(&self, id: &Uuid) -> Option<&TableExtensionReference> {
        self.tables_by_id().get(id)
    }

    /// Data processor with `id`, if registered.
    fn get_data_processor(&self, id: &DataProcessorId) -> Option<&DataProcessorReference> {
        self.data_processors().get(id)
    }
}

/// Finalized, immutable set of extensions with resolved availability.
#[derive(Debug, Default)]
pub struct DataExtensionRepository {
    pub(crate) source_data_cookers: BTreeMap<DataCookerPath, SourceDataCookerReference>,
    pub(crate) composite_data_cookers: BTreeMap<DataCookerPath, CompositeDataCookerReference>,
    pub(crate) tables_by_id: BTreeMap<Uuid, TableExtensionReference>,
    pub(crate) data_processors: BTreeMap<DataProcessorId, DataProcessorReference>,
}

impl DataExtensionLookup for DataExtensionRepository {
    fn source_data_cookers(&self) -> &BTreeMap<DataCookerPath, SourceDataCookerReference> {
        &self.source_data_cookers
    }

    fn composite_data_cookers(&self) -> &BTreeMap<DataCookerPath, CompositeDataCookerReference> {
        &self.composite_data_cookers
    }

    fn tables_by_id(&self) -> &BTreeMap<Uuid, TableExtensionReference> {
        &self.tables_by_id
    }

    fn data_processors(&self) -> &BTreeMap<DataProcessorId, DataProcessorReference> {
        &self.data_processors
    }
}

impl DataExtensionRepository {
    /// Total number of extensions of every kind.
    pub fn extension_count(&self) -> usize {
        self.source_data_cookers.len()
            + self.composite_data_cookers.len()
            + self.tables_by_id.len()
            + self.data_processors.len()
    }

    /// Status of every extension, grouped by kind and sorted by id.
    pub fn extension_statuses(&self) -> Vec<ExtensionStatus> {
        let mut statuses = Vec::with_capacity(self.extension_count());
        statuses.extend(self.source_data_cookers.values().map(ExtensionStatus::of));
        statuses.extend(self.composite_data_cookers.values().map(ExtensionStatus::of));
        statuses.extend(self.data_processors.values().map(ExtensionStatus::of));
        statuses.extend(self.tables_by_id.values().map(|reference| {
            let mut status = ExtensionStatus::of(reference);
            status.name = Some(reference.descriptor().name.clone());
            status
        }));
        statuses
    }

    /// Number of extensions that resolved in error.
    pub fn error_count(&self) -> usize {
        self.extension_statuses()
            .iter()
            .filter(|status| status.availability == DataExtensionAvailability::Error)
            .count()
    }
}

/// Resolution outcome of one extension, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionStatus {
    /// Extension kind
    pub kind: &'static str,
    /// Path, processor id or table GUID
    pub id: String,
    /// Table name, for tables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resolved availability
    pub availability: DataExtensionAvailability,
    /// Reasons for an error availability
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ExtensionStatus {
    fn of<D: DataExtension>(reference: &DataExtensionReference<D>) -> Self {
        let (kind, id) = match reference.extension_id() {
            DataExtensionId::SourceDataCooker(path) => ("source-cooker", path.to_string()),
            DataExtensionId::CompositeDataCooker(path) => ("composite-cooker", path.to_string()),
            DataExtensionId::DataProcessor(id) => ("data-processor", id.to_string()),
            DataExtensionId::Table(id) => ("table", id.to_string()),
        };
        Self {
            kind,
            id,
            name: None,
            availability: reference.availability(),
            errors: reference.errors().to_vec(),
        }
    }
}
