//! Descriptor contracts for data cookers.
//!
//! Plugin authors describe each cooker through [`DataCookerDescriptor`] (identity,
//! requirements, production strategy). Source cookers additionally implement
//! [`SourceDataCookerDescriptor`] to state how they consume each requirement.
//! [`DataCookerSpec`] is a plain value implementing both, used by extension
//! catalogs and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::DataCookerPath;

/// When a cooker's output becomes visible to its consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataProductionStrategy {
    /// Output is complete only once the whole pass over the source has finished.
    #[default]
    PostSourceParsing,
    /// Output is produced element by element while the pass runs.
    AsConsumed,
    /// Output is computed on demand in every pass that consumes it.
    AsRequired,
}

impl fmt::Display for DataProductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PostSourceParsing => "post-source-parsing",
            Self::AsConsumed => "as-consumed",
            Self::AsRequired => "as-required",
        };
        f.write_str(text)
    }
}

/// How a consumer reads one of its required cookers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataCookerDependencyType {
    /// Follow whatever ordering the producer's strategy implies.
    #[default]
    AlignedWithProductionStrategy,
    /// Read the producer's output element by element, after the producer within the pass.
    AsConsumed,
}

impl fmt::Display for DataCookerDependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AlignedWithProductionStrategy => "aligned-with-production-strategy",
            Self::AsConsumed => "as-consumed",
        };
        f.write_str(text)
    }
}

/// Identity and requirements of any data cooker.
pub trait DataCookerDescriptor: fmt::Debug + Send + Sync {
    /// The cooker's unique path.
    fn path(&self) -> &DataCookerPath;

    /// Cookers whose output this cooker consumes, in declaration order.
    fn required_data_cookers(&self) -> &[DataCookerPath];

    /// When this cooker's output becomes visible.
    fn data_production_strategy(&self) -> DataProductionStrategy {
        DataProductionStrategy::PostSourceParsing
    }
}

/// A cooker bound to one source parser.
pub trait SourceDataCookerDescriptor: DataCookerDescriptor {
    /// Explicit dependency types; requirements missing here are aligned.
    fn dependency_types(&self) -> &HashMap<DataCookerPath, DataCookerDependencyType>;

    /// The effective dependency type for `required`.
    fn dependency_type(&self, required: &DataCookerPath) -> DataCookerDependencyType {
        self.dependency_types().get(required).copied().unwrap_or_default()
    }
}

/// A value descriptor for source and composite cookers.
///
/// # Examples
///
/// ```rust
/// use tracecook::cookers::{DataCookerDescriptor, DataCookerSpec, DataProductionStrategy};
///
/// let threads = DataCookerSpec::source("LTTng", "Threads");
/// let switches = DataCookerSpec::source("LTTng", "ContextSwitches")
///     .requires_as_consumed(threads.path().clone());
///
/// assert_eq!(switches.required_data_cookers().len(), 1);
/// assert_eq!(switches.data_production_strategy(), DataProductionStrategy::PostSourceParsing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCookerSpec {
    path: DataCookerPath,
    strategy: DataProductionStrategy,
    required: Vec<DataCookerPath>,
    dependency_types: HashMap<DataCookerPath, DataCookerDependencyType>,
}

impl DataCookerSpec {
    /// A post-source-parsing source cooker without requirements.
    pub fn source(source_parser_id: impl Into<String>, data_cooker_id: impl Into<String>) -> Self {
        Self::new(DataCookerPath::for_source(source_parser_id, data_cooker_id))
    }

    /// A composite cooker without requirements.
    pub fn composite(data_cooker_id: impl Into<String>) -> Self {
        Self::new(DataCookerPath::for_composite(data_cooker_id))
    }

    /// A cooker with the given path and no requirements.
    pub fn new(path: DataCookerPath) -> Self {
        Self {
            path,
            strategy: DataProductionStrategy::default(),
            required: Vec::new(),
            dependency_types: HashMap::new(),
        }
    }

    /// Set the production strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: DataProductionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Add an aligned requirement. Repeated requirements are ignored.
    #[must_use]
    pub fn requires(mut self, path: DataCookerPath) -> Self {
        if !self.required.contains(&path) {
            self.required.push(path);
        }
        self
    }

    /// Add a requirement read as-consumed.
    #[must_use]
    pub fn requires_as_consumed(self, path: DataCookerPath) -> Self {
        self.requires_with_type(path, DataCookerDependencyType::AsConsumed)
    }

    /// Add a requirement with an explicit dependency type.
    #[must_use]
    pub fn requires_with_type(
        mut self,
        path: DataCookerPath,
        dependency_type: DataCookerDependencyType,
    ) -> Self {
        self.dependency_types.insert(path.clone(), dependency_type);
        self.requires(path)
    }
}

impl DataCookerDescriptor for DataCookerSpec {
    fn path(&self) -> &DataCookerPath {
        &self.path
    }

    fn required_data_cookers(&self) -> &[DataCookerPath] {
        &self.required
    }

    fn data_production_strategy(&self) -> DataProductionStrategy {
        self.strategy
    }
}

impl SourceDataCookerDescriptor for DataCookerSpec {
    fn dependency_types(&self) -> &HashMap<DataCookerPath, DataCookerDependencyType> {
        &self.dependency_types
    }
}
