//! Helpers shared by the CLI commands.

use std::path::PathBuf;

use anyhow::Result;

use crate::config::{load_catalogs, resolve_catalog_paths};
use crate::repository::{DataExtensionRepository, DataExtensionRepositoryBuilder};

/// Output format of a command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Load `catalogs` (or the catalogs named in the environment) and finalize them.
pub(crate) async fn load_repository(catalogs: &[PathBuf]) -> Result<DataExtensionRepository> {
    let paths = resolve_catalog_paths(catalogs)?;
    let builder = DataExtensionRepositoryBuilder::new();
    load_catalogs(&paths, &builder).await?;
    Ok(builder.finalize_data_extensions())
}
