//! Configuration for tracecook.
//!
//! Extensions are declared in TOML catalogs (see [`catalog`]). Catalog
//! locations come from the command line or, failing that, from the
//! `TRACECOOK_CATALOG_PATH` environment variable, a platform path list:
//!
//! ```bash
//! # Unix
//! export TRACECOOK_CATALOG_PATH=/opt/plugins/lttng.toml:/opt/plugins/etw.toml
//! # Windows
//! set TRACECOOK_CATALOG_PATH=C:\plugins\lttng.toml;C:\plugins\etw.toml
//! ```
//!
//! Log filtering follows `RUST_LOG` unless `--verbose` or `--quiet` is given.

pub mod catalog;

use std::ffi::OsStr;
use std::path::PathBuf;

use anyhow::{Result, bail};

pub use catalog::{
    CompositeCookerEntry, DataProcessorEntry, ExtensionCatalog, RegistrationSummary,
    SourceCookerEntry, TableEntry, load_catalogs,
};

use crate::constants::CATALOG_PATH_ENV;

/// Catalog paths listed in the environment, in order. Empty entries are skipped.
pub fn catalog_paths_from_env() -> Vec<PathBuf> {
    std::env::var_os(CATALOG_PATH_ENV)
        .map(|value| split_catalog_paths(&value))
        .unwrap_or_default()
}

/// Split a platform path list into catalog paths.
pub fn split_catalog_paths(value: &OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value).filter(|path| !path.as_os_str().is_empty()).collect()
}

/// The catalogs to load: `explicit` if non-empty, otherwise the environment.
///
/// # Errors
///
/// Returns an error if neither source names a catalog.
pub fn resolve_catalog_paths(explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    let from_env = catalog_paths_from_env();
    if from_env.is_empty() {
        bail!("No extension catalogs given. Pass catalog files or set {CATALOG_PATH_ENV}");
    }
    Ok(from_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_split_catalog_paths_skips_empty_entries() {
        let joined = std::env::join_paths(["a.toml", "", "b.toml"]).unwrap();
        let paths = split_catalog_paths(&joined);
        assert_eq!(paths, vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]);
        assert!(split_catalog_paths(&OsString::new()).is_empty());
    }

    #[test]
    fn test_explicit_paths_win() {
        let explicit = vec![PathBuf::from("one.toml")];
        assert_eq!(resolve_catalog_paths(&explicit).unwrap(), explicit);
    }
}
