//! Integration test suite for tracecook
//!
//! End-to-end tests over catalogs written to temporary directories.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: catalog loading → repository → enabling → scheduling through the library
//! - **validate**: the `validate` command
//! - **schedule**: the `schedule` command

mod pipeline;
mod schedule;
mod validate;

use assert_cmd::Command;
use tracecook::constants::CATALOG_PATH_ENV;

/// The `tracecook` binary with a clean catalog environment, no colors and no logging.
pub fn tracecook() -> Command {
    let mut cmd = Command::cargo_bin("tracecook").unwrap();
    cmd.env_remove(CATALOG_PATH_ENV).env_remove("RUST_LOG").env("NO_COLOR", "1").arg("--quiet");
    cmd
}
