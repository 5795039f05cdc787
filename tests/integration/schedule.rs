use predicates::prelude::*;
use tracecook::test_utils::{CPU_USAGE_TABLE, CatalogFixture, TestCatalogs};

use super::tracecook;

#[test]
fn test_schedule_all_tables_text() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng(), CatalogFixture::etw()]).unwrap();

    tracecook()
        .arg("schedule")
        .args(catalogs.paths())
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled tables:"))
        .stdout(predicate::str::contains("CPU Usage (6b0c1a4e-2f1d-4e8e-9e53-0c8a8f3c2d11)"))
        .stdout(predicate::str::contains("Source parser 'ETW': 1 pass(es)"))
        .stdout(predicate::str::contains("Source parser 'LTTng': 2 pass(es)"))
        .stdout(predicate::str::contains(
            "Pass 0: LTTng/Threads, LTTng/Stacks, LTTng/Syscalls, LTTng/CpuSamples",
        ))
        .stdout(predicate::str::contains("Pass 1: LTTng/ContextSwitches"));
}

#[test]
fn test_schedule_one_table_json() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng(), CatalogFixture::etw()]).unwrap();

    let output = tracecook()
        .args(["schedule", "--format", "json", "--table", &CPU_USAGE_TABLE.to_string()])
        .args(catalogs.paths())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["tables"].as_array().unwrap().len(), 1);
    assert_eq!(report["tables"][0]["name"], "CPU Usage");

    let sources = report["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0]["source_parser_id"], "LTTng");
    assert_eq!(
        sources[0]["passes"],
        serde_json::json!([["LTTng/Threads"], ["LTTng/ContextSwitches"]])
    );
    assert_eq!(
        sources[0]["placements"]["LTTng/ContextSwitches"],
        serde_json::json!([{ "pass": 1, "block": 0 }])
    );
}

#[test]
fn test_schedule_cookers_only() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng()]).unwrap();

    tracecook()
        .args(["schedule", "--cooker", "LTTng/CpuSamples"])
        .args(catalogs.paths())
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabled tables:").not())
        .stdout(predicate::str::contains("Pass 0: LTTng/Stacks, LTTng/CpuSamples"));
}

#[test]
fn test_schedule_unavailable_table_enables_nothing() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::broken()]).unwrap();

    tracecook()
        .arg("schedule")
        .args(catalogs.paths())
        .assert()
        .success()
        .stdout(predicate::str::contains("No data cookers enabled"));
}

#[test]
fn test_schedule_rejects_malformed_cooker_path() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng()]).unwrap();

    tracecook()
        .args(["schedule", "--cooker", "NoSeparator"])
        .args(catalogs.paths())
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing '/' separator"));
}

#[test]
fn test_schedule_table_flags_conflict() {
    tracecook()
        .args(["schedule", "--all-tables", "--table", &CPU_USAGE_TABLE.to_string()])
        .assert()
        .failure();
}

#[test]
fn test_schedule_unknown_table_fails() {
    let catalogs = TestCatalogs::with(&[CatalogFixture::lttng()]).unwrap();

    tracecook()
        .args(["schedule", "--table", "00000000-0000-0000-0000-000000000063"])
        .args(catalogs.paths())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Data extension '00000000-0000-0000-0000-000000000063' is not registered",
        ))
        .stderr(predicate::str::contains("tracecook validate"));
}
