//! TOML extension catalogs.
//!
//! A catalog declares data extensions the way a plugin would register them at
//! discovery time. Several catalogs can be loaded at once into a single
//! [`DataExtensionRepositoryBuilder`]:
//!
//! ```toml
//! [[source_cookers]]
//! source = "LTTng"
//! id = "ContextSwitches"
//! strategy = "post-source-parsing"
//! requires = ["LTTng/Threads"]
//! [source_cookers.dependency_types]
//! "LTTng/Threads" = "as-consumed"
//!
//! [[composite_cookers]]
//! id = "CpuUsage"
//! requires = ["LTTng/ContextSwitches"]
//!
//! [[data_processors]]
//! id = "SymbolResolver"
//! requires = ["LTTng/Modules"]
//!
//! [[tables]]
//! id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d11"
//! name = "CPU Usage"
//! category = "Computation"
//! requires = ["/CpuUsage"]
//! requires_processors = ["SymbolResolver"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::catalog_load_timeout;
use crate::cookers::{
    DataCookerDependencyType, DataCookerPath, DataCookerSpec, DataProductionStrategy,
};
use crate::core::TracecookError;
use crate::repository::{
    DataExtensionRepositoryBuilder, DataProcessorDescriptor, DataProcessorId, TableDescriptor,
};

/// One catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCatalog {
    /// Cookers bound to a source parser
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_cookers: Vec<SourceCookerEntry>,
    /// Cookers combining other cookers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite_cookers: Vec<CompositeCookerEntry>,
    /// Data processors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_processors: Vec<DataProcessorEntry>,
    /// Tables
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableEntry>,
}

/// `[[source_cookers]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCookerEntry {
    /// Source parser id
    pub source: String,
    /// Cooker id, unique within the source
    pub id: String,
    /// When the cooker's output becomes available
    #[serde(default)]
    pub strategy: DataProductionStrategy,
    /// Required cookers of the same source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<DataCookerPath>,
    /// Per-requirement dependency types; unlisted requirements are aligned
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependency_types: BTreeMap<DataCookerPath, DataCookerDependencyType>,
}

/// `[[composite_cookers]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeCookerEntry {
    /// Cooker id
    pub id: String,
    /// Required cookers of any source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<DataCookerPath>,
}

/// `[[data_processors]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataProcessorEntry {
    /// Processor id
    pub id: DataProcessorId,
    /// Required cookers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<DataCookerPath>,
    /// Required processors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_processors: Vec<DataProcessorId>,
}

/// `[[tables]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Table GUID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Display category
    #[serde(default)]
    pub category: String,
    /// Required cookers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<DataCookerPath>,
    /// Required processors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_processors: Vec<DataProcessorId>,
}

/// How many entries of a catalog the builder accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    /// Entries accepted
    pub registered: usize,
    /// Entries rejected as duplicates
    pub rejected: usize,
}

impl RegistrationSummary {
    fn record(&mut self, accepted: bool) {
        if accepted {
            self.registered += 1;
        } else {
            self.rejected += 1;
        }
    }
}

impl std::ops::AddAssign for RegistrationSummary {
    fn add_assign(&mut self, other: Self) {
        self.registered += other.registered;
        self.rejected += other.rejected;
    }
}

impl ExtensionCatalog {
    /// Parse catalog text. `file` is only used in error messages.
    ///
    /// # Errors
    ///
    /// [`TracecookError::CatalogParseError`] for invalid TOML, a malformed
    /// cooker path, or an entry that is structurally wrong.
    pub fn parse(content: &str, file: &Path) -> Result<Self, TracecookError> {
        let catalog: Self = toml::from_str(content).map_err(|e| TracecookError::CatalogParseError {
            file: file.display().to_string(),
            reason: e.message().to_string(),
        })?;
        catalog.validate().map_err(|reason| TracecookError::CatalogParseError {
            file: file.display().to_string(),
            reason,
        })?;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = Self::parse(&content, path)?;
        debug!(
            "Loaded catalog {} ({} entries)",
            path.display(),
            catalog.entry_count()
        );
        Ok(catalog)
    }

    /// Total number of entries.
    pub fn entry_count(&self) -> usize {
        self.source_cookers.len()
            + self.composite_cookers.len()
            + self.data_processors.len()
            + self.tables.len()
    }

    /// Register every entry with `builder`.
    pub fn register(&self, builder: &DataExtensionRepositoryBuilder) -> RegistrationSummary {
        let mut summary = RegistrationSummary::default();

        for entry in &self.source_cookers {
            let mut cooker =
                DataCookerSpec::source(&entry.source, &entry.id).with_strategy(entry.strategy);
            for required in &entry.requires {
                let dependency_type = entry.dependency_types.get(required).copied().unwrap_or_default();
                cooker = cooker.requires_with_type(required.clone(), dependency_type);
            }
            summary.record(builder.add_source_data_cooker(Arc::new(cooker)));
        }

        for entry in &self.composite_cookers {
            let cooker = entry
                .requires
                .iter()
                .cloned()
                .fold(DataCookerSpec::composite(&entry.id), DataCookerSpec::requires);
            summary.record(builder.add_composite_data_cooker(Arc::new(cooker)));
        }

        for entry in &self.data_processors {
            let mut processor = DataProcessorDescriptor::new(entry.id.as_str());
            for required in &entry.requires {
                processor = processor.requires(required.clone());
            }
            for required in &entry.requires_processors {
                processor = processor.requires_processor(required.clone());
            }
            summary.record(builder.add_data_processor(processor));
        }

        for entry in &self.tables {
            let mut table =
                TableDescriptor::new(entry.id, &entry.name).with_category(&entry.category);
            for required in &entry.requires {
                table = table.requires(required.clone());
            }
            for required in &entry.requires_processors {
                table = table.requires_processor(required.clone());
            }
            summary.record(builder.add_table(table));
        }

        summary
    }

    fn validate(&self) -> Result<(), String> {
        for entry in &self.source_cookers {
            if entry.source.trim().is_empty() {
                return Err(format!("source cooker '{}' has an empty source", entry.id));
            }
            if entry.id.trim().is_empty() {
                return Err(format!("source cooker of '{}' has an empty id", entry.source));
            }
            DataCookerPath::try_for_source(&entry.source, &entry.id).map_err(|e| e.to_string())?;
            if let Some(path) =
                entry.dependency_types.keys().find(|path| !entry.requires.contains(path))
            {
                return Err(format!(
                    "source cooker '{}/{}' sets a dependency type for '{path}', which it does not require",
                    entry.source, entry.id
                ));
            }
        }
        if self.composite_cookers.iter().any(|e| e.id.trim().is_empty()) {
            return Err("composite cooker with an empty id".to_string());
        }
        if self.data_processors.iter().any(|e| e.id.as_str().trim().is_empty()) {
            return Err("data processor with an empty id".to_string());
        }
        Ok(())
    }
}

/// Load `paths` concurrently and register their contents with `builder`.
///
/// # Errors
///
/// Returns the first load error; catalogs that loaded before it stay registered.
pub async fn load_catalogs(
    paths: &[PathBuf],
    builder: &DataExtensionRepositoryBuilder,
) -> Result<RegistrationSummary> {
    let futures: Vec<_> = paths
        .iter()
        .map(|path| async move {
            let catalog = ExtensionCatalog::load(path).await?;
            Ok::<_, anyhow::Error>(catalog.register(builder))
        })
        .collect();

    let results = tokio::time::timeout(catalog_load_timeout(), join_all(futures))
        .await
        .context("Timed out loading extension catalogs")?;

    let mut total = RegistrationSummary::default();
    for result in results {
        total += result?;
    }
    info!(
        "Registered {} extension(s) from {} catalog(s), {} rejected",
        total.registered,
        paths.len(),
        total.rejected
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DataExtensionLookup;
    use tempfile::TempDir;

    const CATALOG: &str = r#"
[[source_cookers]]
source = "LTTng"
id = "Threads"

[[source_cookers]]
source = "LTTng"
id = "ContextSwitches"
strategy = "as-consumed"
requires = ["LTTng/Threads"]
[source_cookers.dependency_types]
"LTTng/Threads" = "as-consumed"

[[composite_cookers]]
id = "CpuUsage"
requires = ["LTTng/ContextSwitches"]

[[data_processors]]
id = "Symbols"
requires = ["LTTng/Threads"]

[[tables]]
id = "6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d11"
name = "CPU Usage"
category = "Computation"
requires = ["/CpuUsage"]
requires_processors = ["Symbols"]
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = ExtensionCatalog::parse(CATALOG, Path::new("catalog.toml")).unwrap();
        assert_eq!(catalog.entry_count(), 5);

        let switches = &catalog.source_cookers[1];
        assert_eq!(switches.strategy, DataProductionStrategy::AsConsumed);
        assert_eq!(
            switches.dependency_types.get(&DataCookerPath::for_source("LTTng", "Threads")),
            Some(&DataCookerDependencyType::AsConsumed)
        );
        assert_eq!(catalog.source_cookers[0].strategy, DataProductionStrategy::PostSourceParsing);
        assert_eq!(catalog.tables[0].requires, vec![DataCookerPath::for_composite("CpuUsage")]);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let bad_path = "[[composite_cookers]]\nid = \"X\"\nrequires = [\"NoSeparator\"]\n";
        let error = ExtensionCatalog::parse(bad_path, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(error, TracecookError::CatalogParseError { ref file, .. } if file == "bad.toml"));

        let stray_type = r#"
[[source_cookers]]
source = "S"
id = "A"
[source_cookers.dependency_types]
"S/B" = "as-consumed"
"#;
        let error = ExtensionCatalog::parse(stray_type, Path::new("stray.toml")).unwrap_err();
        assert!(error.to_string().contains("does not require"));

        let bad_strategy = "[[source_cookers]]\nsource = \"S\"\nid = \"A\"\nstrategy = \"eager\"\n";
        assert!(ExtensionCatalog::parse(bad_strategy, Path::new("s.toml")).is_err());
    }

    #[test]
    fn test_parse_rejects_source_with_separator() {
        // "A/B/C" would read back as source "A", cooker "B/C"
        let nested = r#"
[[source_cookers]]
source = "A/B"
id = "C"

[[source_cookers]]
source = "A"
id = "D"
requires = ["A/B/C"]
"#;
        let error = ExtensionCatalog::parse(nested, Path::new("nested.toml")).unwrap_err();
        assert!(matches!(error, TracecookError::CatalogParseError { .. }));
        assert!(error.to_string().contains("source parser id must not contain '/'"));
    }

    #[test]
    fn test_register_builds_descriptors() {
        let catalog = ExtensionCatalog::parse(CATALOG, Path::new("catalog.toml")).unwrap();
        let builder = DataExtensionRepositoryBuilder::new();
        let summary = catalog.register(&builder);
        assert_eq!(summary, RegistrationSummary { registered: 5, rejected: 0 });

        // Registering the same catalog twice rejects every entry
        assert_eq!(catalog.register(&builder).rejected, 5);

        let repository = builder.finalize_data_extensions();
        let switches = repository
            .get_source_data_cooker(&DataCookerPath::for_source("LTTng", "ContextSwitches"))
            .unwrap();
        assert!(switches.is_available());
        assert_eq!(
            switches.descriptor().dependency_type(&DataCookerPath::for_source("LTTng", "Threads")),
            DataCookerDependencyType::AsConsumed
        );
        assert!(repository.tables_by_id().values().all(|table| table.is_available()));
    }

    #[tokio::test]
    async fn test_load_catalogs_concurrently() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.toml");
        let second = temp.path().join("second.toml");
        std::fs::write(&first, CATALOG).unwrap();
        std::fs::write(&second, "[[source_cookers]]\nsource = \"ETW\"\nid = \"DiskIo\"\n").unwrap();

        let builder = DataExtensionRepositoryBuilder::new();
        let summary = load_catalogs(&[first, second], &builder).await.unwrap();
        assert_eq!(summary.registered, 6);
        assert_eq!(builder.len(), 6);
    }

    #[tokio::test]
    async fn test_load_missing_catalog_fails() {
        let temp = TempDir::new().unwrap();
        let builder = DataExtensionRepositoryBuilder::new();
        let error = load_catalogs(&[temp.path().join("missing.toml")], &builder).await.unwrap_err();
        assert!(error.to_string().contains("Failed to read catalog"));
    }
}
