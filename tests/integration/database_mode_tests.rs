//! Integration tests for database mode: paired DuckDB files compared table by table

use crate::common::{sample_data, CliTestRunner, TestFixture};
use csvdiff::compare::compare_databases;
use csvdiff::{CsvdiffError, DiffConfig, DiffKey};
use std::fs;

const PEOPLE_V1: &str = "id,name\n1,Alice\n2,Bob\n";
const PEOPLE_V2: &str = "id,name\n1,Alice\n2,Robert\n";

fn keys() -> Vec<String> {
    vec!["id".to_string()]
}

#[test]
fn test_compare_two_database_files() {
    let fixture = TestFixture::new().unwrap();
    let origin = fixture
        .create_database("v1.duckdb", &[("people", PEOPLE_V1)])
        .unwrap();
    let compare = fixture
        .create_database("v2.duckdb", &[("people", PEOPLE_V2)])
        .unwrap();

    let config = DiffConfig::database(&origin, &compare, keys()).unwrap();
    let results = compare_databases(&config).unwrap();
    assert_eq!(results.len(), 1);

    let (table_diff, report) = &results[0];
    assert_eq!(table_diff.database.as_deref(), Some("v1.duckdb"));
    assert_eq!(table_diff.left_table, "people");
    assert_eq!(table_diff.right_table, "second.people");
    assert_eq!(table_diff.index.len(), 1);
    assert_eq!(table_diff.index.get(&DiffKey::single(2.0)).unwrap().len(), 2);
    assert_eq!(report.find("2").unwrap().rows[0].changed_columns(), vec!["name"]);
}

#[test]
fn test_compare_database_folders() {
    let fixture = TestFixture::new().unwrap();
    fixture
        .create_database("origin/shop.duckdb", &[("people", PEOPLE_V1), ("orders", sample_data::ORDERS_V1)])
        .unwrap();
    fixture
        .create_database("compare/shop.duckdb", &[("people", PEOPLE_V1), ("orders", sample_data::ORDERS_V2)])
        .unwrap();
    fixture
        .create_database("origin/same.duckdb", &[("people", PEOPLE_V1)])
        .unwrap();
    fixture
        .create_database("compare/same.duckdb", &[("people", PEOPLE_V1)])
        .unwrap();
    fixture.create_csv_raw("origin/notes.txt", "not a database").unwrap();

    // people has no order_id column
    let config = DiffConfig::database(
        fixture.root().join("origin"),
        fixture.root().join("compare"),
        vec!["order_id".to_string()],
    )
    .unwrap()
    .with_ignored(["same.duckdb"]);
    let err = compare_databases(&config).unwrap_err();
    assert!(matches!(err, CsvdiffError::SchemaMismatch { .. }));

    let config = DiffConfig::database(
        fixture.root().join("origin"),
        fixture.root().join("compare"),
        vec!["row_id".to_string()],
    )
    .unwrap();
    let results = compare_databases(&config).unwrap();
    assert_eq!(results.len(), 1);
    let (table_diff, _) = &results[0];
    assert_eq!(table_diff.database.as_deref(), Some("shop.duckdb"));
    assert_eq!(table_diff.left_table, "orders");
    assert_eq!(table_diff.index.shape(), (1, 0, 0));
}

#[test]
fn test_ignored_database_is_skipped() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_database("origin/a.duckdb", &[("people", PEOPLE_V1)]).unwrap();
    fixture.create_database("compare/a.duckdb", &[("people", PEOPLE_V2)]).unwrap();

    let config = DiffConfig::database(
        fixture.root().join("origin"),
        fixture.root().join("compare"),
        keys(),
    )
    .unwrap()
    .with_ignored(["a.duckdb"]);
    assert!(compare_databases(&config).unwrap().is_empty());
}

#[test]
fn test_missing_counterpart_database_fails() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_database("origin/a.duckdb", &[("people", PEOPLE_V1)]).unwrap();
    fs::create_dir_all(fixture.root().join("compare")).unwrap();

    let config = DiffConfig::database(
        fixture.root().join("origin"),
        fixture.root().join("compare"),
        keys(),
    )
    .unwrap();
    let err = compare_databases(&config).unwrap_err();
    assert!(matches!(err, CsvdiffError::SchemaMismatch { .. }));
}

#[test]
fn test_missing_counterpart_table_fails() {
    let fixture = TestFixture::new().unwrap();
    let origin = fixture
        .create_database("v1.duckdb", &[("people", PEOPLE_V1), ("orders", sample_data::ORDERS_V1)])
        .unwrap();
    let compare = fixture.create_database("v2.duckdb", &[("people", PEOPLE_V1)]).unwrap();

    let config = DiffConfig::database(&origin, &compare, vec!["row_id".to_string()]).unwrap();
    let err = compare_databases(&config).unwrap_err();
    assert!(matches!(err, CsvdiffError::SchemaMismatch { .. }));
}

#[test]
fn test_non_database_locations_rejected() {
    let fixture = TestFixture::new().unwrap();
    let a = fixture.create_csv_raw("a.csv", PEOPLE_V1).unwrap();
    let b = fixture.create_csv_raw("b.csv", PEOPLE_V2).unwrap();

    let config = DiffConfig::database(&a, &b, keys()).unwrap();
    let err = compare_databases(&config).unwrap_err();
    assert!(matches!(err, CsvdiffError::DiffConfig { .. }));
}

#[test]
fn test_cli_database_mode_with_base_path() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_database("dbs/old/a.duckdb", &[("people", PEOPLE_V1)]).unwrap();
    fixture.create_database("dbs/new/a.duckdb", &[("people", PEOPLE_V2)]).unwrap();

    let output = fixture.path_str("db_report.json");
    runner.expect_success(&[
        "compare",
        "-m", "database",
        "-f", "old", "new",
        "-p", &fixture.path_str("dbs"),
        "-k", "id",
        "--format", "json",
        "--output", &output,
    ]);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let reports = json.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["left_source"], "a.duckdb:people");
    assert_eq!(reports[0]["keys"][0]["key"], "2");
}
