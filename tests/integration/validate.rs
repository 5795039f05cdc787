use predicates::prelude::*;
use tracecook::constants::CATALOG_PATH_ENV;
use tracecook::test_utils::{CatalogFixture, TestCatalogs};

use super::tracecook;

#[test]
fn test_validate_valid_catalogs() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng(), CatalogFixture::etw()]).unwrap();

    tracecook()
        .arg("validate")
        .args(catalogs.paths())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ source-cooker LTTng/Threads"))
        .stdout(predicate::str::contains("table 6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d21 (Disk)"))
        .stdout(predicate::str::contains("12 extension(s): 12 available, 0 in error"));
}

#[test]
fn test_validate_reports_every_error_then_fails() {
    let catalogs =
        TestCatalogs::with(&[CatalogFixture::lttng(), CatalogFixture::broken()]).unwrap();

    tracecook()
        .arg("validate")
        .args(catalogs.paths())
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ source-cooker LTTng/Broken"))
        .stdout(predicate::str::contains("Required data cooker 'LTTng/Missing' is not registered"))
        .stdout(predicate::str::contains("2 in error"))
        .stderr(predicate::str::contains("2 data extension(s) failed dependency resolution"));
}

#[test]
fn test_validate_json() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::cyclic()]).unwrap();

    let output = tracecook()
        .args(["validate", "--format", "json"])
        .args(catalogs.paths())
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"], 2);
    assert_eq!(report["extensions"][0]["id"], "S/A");
    assert_eq!(report["extensions"][0]["availability"], "error");
    assert!(
        report["extensions"][0]["errors"][0]
            .as_str()
            .unwrap()
            .starts_with("Circular dependency")
    );
}

#[test]
fn test_validate_uses_catalog_path_env() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::etw()]).unwrap();
    let joined = std::env::join_paths(catalogs.paths()).unwrap();

    tracecook()
        .env(CATALOG_PATH_ENV, joined)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("ETW/DiskIo"));
}

#[test]
fn test_validate_without_catalogs_fails() {
    tracecook()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No extension catalogs given"));
}

#[test]
fn test_validate_invalid_catalog() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::invalid_syntax()]).unwrap();

    tracecook()
        .arg("validate")
        .args(catalogs.paths())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid extension catalog"));
}

#[test]
fn test_validate_missing_file() {
    let catalogs = TestCatalogs::new().unwrap();

    tracecook()
        .arg("validate")
        .arg(catalogs.dir().join("nowhere.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read catalog"));
}
