//! Test utilities for tracecook
//!
//! Shared by unit tests and, through the `test-utils` feature, by the
//! integration suite:
//! - One-time tracing initialization
//! - Catalog fixtures written into temporary directories
//!
//! # Example
//!
//! ```rust,no_run
//! use tracecook::test_utils::{CatalogFixture, TestCatalogs};
//!
//! let catalogs = TestCatalogs::with(&[CatalogFixture::lttng()]).unwrap();
//! assert_eq!(catalogs.paths().len(), 1);
//! ```

pub mod fixtures;

pub use fixtures::{
    BROKEN_TABLE, CPU_SAMPLES_TABLE, CPU_USAGE_TABLE, CatalogFixture, DISK_TABLE, SYSCALLS_TABLE,
};

use std::path::{Path, PathBuf};
use std::sync::Once;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`; with neither, logging stays
/// off. Only the first call has any effect.
///
/// ```bash
/// RUST_LOG=tracecook::scheduler=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Catalog files in a temporary directory, removed on drop.
pub struct TestCatalogs {
    dir: TempDir,
    paths: Vec<PathBuf>,
}

impl TestCatalogs {
    /// An empty catalog directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create catalog directory")?,
            paths: Vec::new(),
        })
    }

    /// A directory holding `fixtures`.
    pub fn with(fixtures: &[CatalogFixture]) -> Result<Self> {
        let mut catalogs = Self::new()?;
        for fixture in fixtures {
            catalogs.add(fixture)?;
        }
        Ok(catalogs)
    }

    /// Write `fixture` and remember its path.
    pub fn add(&mut self, fixture: &CatalogFixture) -> Result<PathBuf> {
        let path = fixture.write_to(self.dir.path())?;
        self.paths.push(path.clone());
        Ok(path)
    }

    /// The directory the catalogs live in.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Paths of every written catalog, in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}
