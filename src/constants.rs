//! Constants shared by the catalog loader and the CLI.

use std::time::Duration;

/// Environment variable holding a platform path list of extension catalogs.
///
/// Used when no catalog is given on the command line.
pub const CATALOG_PATH_ENV: &str = "TRACECOOK_CATALOG_PATH";

/// Timeout for loading a batch of catalogs with `join_all` (30 seconds).
///
/// Catalogs are small local files; hitting this means a stalled filesystem.
pub fn catalog_load_timeout() -> Duration {
    Duration::from_secs(30)
}
