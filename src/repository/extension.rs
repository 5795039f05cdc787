//! Extension identities, descriptors and resolved references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::cookers::{DataCookerDescriptor, DataCookerPath, SourceDataCookerDescriptor};

/// Identifier of a data processor extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataProcessorId(String);

impl DataProcessorId {
    /// Wrap an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A table extension: the consumer the user ultimately selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Unique table id
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Display category
    pub category: String,
    /// Cookers the table reads
    pub required_data_cookers: Vec<DataCookerPath>,
    /// Processors the table reads
    pub required_data_processors: Vec<DataProcessorId>,
}

impl TableDescriptor {
    /// A table without requirements.
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: String::new(),
            required_data_cookers: Vec::new(),
            required_data_processors: Vec::new(),
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Require a cooker.
    #[must_use]
    pub fn requires(mut self, path: DataCookerPath) -> Self {
        if !self.required_data_cookers.contains(&path) {
            self.required_data_cookers.push(path);
        }
        self
    }

    /// Require a data processor.
    #[must_use]
    pub fn requires_processor(mut self, id: DataProcessorId) -> Self {
        if !self.required_data_processors.contains(&id) {
            self.required_data_processors.push(id);
        }
        self
    }
}

/// A data processor extension, which derives data from cookers and other processors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProcessorDescriptor {
    /// Unique processor id
    pub id: DataProcessorId,
    /// Cookers the processor reads
    pub required_data_cookers: Vec<DataCookerPath>,
    /// Processors the processor reads
    pub required_data_processors: Vec<DataProcessorId>,
}

impl DataProcessorDescriptor {
    /// A processor without requirements.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: DataProcessorId::new(id),
            required_data_cookers: Vec::new(),
            required_data_processors: Vec::new(),
        }
    }

    /// Require a cooker.
    #[must_use]
    pub fn requires(mut self, path: DataCookerPath) -> Self {
        if !self.required_data_cookers.contains(&path) {
            self.required_data_cookers.push(path);
        }
        self
    }

    /// Require another processor.
    #[must_use]
    pub fn requires_processor(mut self, id: DataProcessorId) -> Self {
        if !self.required_data_processors.contains(&id) {
            self.required_data_processors.push(id);
        }
        self
    }
}

/// Identity of any registered extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataExtensionId {
    /// A cooker bound to a source parser
    SourceDataCooker(DataCookerPath),
    /// A cooker combining other cookers' output
    CompositeDataCooker(DataCookerPath),
    /// A data processor
    DataProcessor(DataProcessorId),
    /// A table
    Table(Uuid),
}

impl DataExtensionId {
    /// The id under which a required cooker path is registered.
    pub fn for_data_cooker(path: &DataCookerPath) -> Self {
        if path.is_composite_data_cooker() {
            Self::CompositeDataCooker(path.clone())
        } else {
            Self::SourceDataCooker(path.clone())
        }
    }
}

impl fmt::Display for DataExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceDataCooker(path) => write!(f, "source cooker '{path}'"),
            Self::CompositeDataCooker(path) => write!(f, "composite cooker '{path}'"),
            Self::DataProcessor(id) => write!(f, "data processor '{id}'"),
            Self::Table(id) => write!(f, "table '{id}'"),
        }
    }
}

/// Whether an extension can be used once dependencies are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataExtensionAvailability {
    /// Dependencies have not been processed yet
    #[default]
    Undetermined,
    /// Every requirement is registered and available
    Available,
    /// A requirement is missing, in error, or on a cycle
    Error,
}

impl fmt::Display for DataExtensionAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Undetermined => "undetermined",
            Self::Available => "available",
            Self::Error => "error",
        };
        f.write_str(text)
    }
}

/// Transitive requirements of an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataExtensionDependencies {
    /// Source cookers reachable through requirements
    pub source_data_cookers: BTreeSet<DataCookerPath>,
    /// Composite cookers reachable through requirements
    pub composite_data_cookers: BTreeSet<DataCookerPath>,
    /// Processors reachable through requirements
    pub data_processors: BTreeSet<DataProcessorId>,
}

impl DataExtensionDependencies {
    /// Source parsers that must be present for the extension to work.
    pub fn required_source_parsers(&self) -> BTreeSet<&str> {
        self.source_data_cookers.iter().map(DataCookerPath::source_parser_id).collect()
    }

    /// Record `id` and everything it requires.
    pub(crate) fn include(&mut self, id: &DataExtensionId, closure: &Self) {
        match id {
            DataExtensionId::SourceDataCooker(path) => {
                self.source_data_cookers.insert(path.clone());
            }
            DataExtensionId::CompositeDataCooker(path) => {
                self.composite_data_cookers.insert(path.clone());
            }
            DataExtensionId::DataProcessor(processor) => {
                self.data_processors.insert(processor.clone());
            }
            DataExtensionId::Table(_) => {}
        }
        self.source_data_cookers.extend(closure.source_data_cookers.iter().cloned());
        self.composite_data_cookers.extend(closure.composite_data_cookers.iter().cloned());
        self.data_processors.extend(closure.data_processors.iter().cloned());
    }
}

/// The requirement surface dependency resolution needs from each extension kind.
pub trait DataExtension {
    /// Identity in the repository.
    fn extension_id(&self) -> DataExtensionId;

    /// Required cookers, in declaration order.
    fn required_data_cookers(&self) -> &[DataCookerPath];

    /// Required processors, in declaration order.
    fn required_data_processors(&self) -> &[DataProcessorId] {
        &[]
    }
}

impl DataExtension for Arc<dyn SourceDataCookerDescriptor> {
    fn extension_id(&self) -> DataExtensionId {
        DataExtensionId::SourceDataCooker(self.path().clone())
    }

    fn required_data_cookers(&self) -> &[DataCookerPath] {
        DataCookerDescriptor::required_data_cookers(self.as_ref())
    }
}

impl DataExtension for Arc<dyn DataCookerDescriptor> {
    fn extension_id(&self) -> DataExtensionId {
        DataExtensionId::CompositeDataCooker(self.path().clone())
    }

    fn required_data_cookers(&self) -> &[DataCookerPath] {
        DataCookerDescriptor::required_data_cookers(self.as_ref())
    }
}

impl DataExtension for TableDescriptor {
    fn extension_id(&self) -> DataExtensionId {
        DataExtensionId::Table(self.id)
    }

    fn required_data_cookers(&self) -> &[DataCookerPath] {
        &self.required_data_cookers
    }

    fn required_data_processors(&self) -> &[DataProcessorId] {
        &self.required_data_processors
    }
}

impl DataExtension for DataProcessorDescriptor {
    fn extension_id(&self) -> DataExtensionId {
        DataExtensionId::DataProcessor(self.id.clone())
    }

    fn required_data_cookers(&self) -> &[DataCookerPath] {
        &self.required_data_cookers
    }

    fn required_data_processors(&self) -> &[DataProcessorId] {
        &self.required_data_processors
    }
}

/// A registered extension together with its resolved dependency state.
#[derive(Debug, Clone)]
pub struct DataExtensionReference<D> {
    descriptor: D,
    availability: DataExtensionAvailability,
    errors: Vec<String>,
    dependencies: DataExtensionDependencies,
}

/// A registered source cooker.
pub type SourceDataCookerReference = DataExtensionReference<Arc<dyn SourceDataCookerDescriptor>>;
/// A registered composite cooker.
pub type CompositeDataCookerReference = DataExtensionReference<Arc<dyn DataCookerDescriptor>>;
/// A registered table.
pub type TableExtensionReference = DataExtensionReference<TableDescriptor>;
/// A registered data processor.
pub type DataProcessorReference = DataExtensionReference<DataProcessorDescriptor>;

impl<D: DataExtension> DataExtensionReference<D> {
    /// An unresolved reference.
    pub fn new(descriptor: D) -> Self {
        Self {
            descriptor,
            availability: DataExtensionAvailability::Undetermined,
            errors: Vec::new(),
            dependencies: DataExtensionDependencies::default(),
        }
    }

    /// The wrapped descriptor.
    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    /// Identity in the repository.
    pub fn extension_id(&self) -> DataExtensionId {
        self.descriptor.extension_id()
    }

    /// Directly required cookers.
    pub fn required_data_cookers(&self) -> &[DataCookerPath] {
        self.descriptor.required_data_cookers()
    }

    /// Directly required processors.
    pub fn required_data_processors(&self) -> &[DataProcessorId] {
        self.descriptor.required_data_processors()
    }

    /// Resolved availability.
    pub fn availability(&self) -> DataExtensionAvailability {
        self.availability
    }

    /// Whether the extension resolved as available.
    pub fn is_available(&self) -> bool {
        self.availability == DataExtensionAvailability::Available
    }

    /// Human-readable reasons for an error availability.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Transitive requirements.
    pub fn dependencies(&self) -> &DataExtensionDependencies {
        &self.dependencies
    }

    /// Apply the result of dependency processing. Availability is decided once.
    pub(crate) fn resolve(&mut self, errors: Vec<String>, dependencies: DataExtensionDependencies) {
        debug_assert_eq!(self.availability, DataExtensionAvailability::Undetermined);
        self.availability = if errors.is_empty() {
            DataExtensionAvailability::Available
        } else {
            DataExtensionAvailability::Error
        };
        self.errors = errors;
        self.dependencies = dependencies;
    }
}
