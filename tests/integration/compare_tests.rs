//! Integration tests for the compare command and pipeline

use crate::common::{sample_data, CliTestRunner, TestFixture};
use csvdiff::compare::{compare_files, CompareRequest};
use csvdiff::report::FieldStatus;
use csvdiff::{CellValue, CsvdiffError, DiffKey, Origin};
use std::fs;

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_compare_files_end_to_end() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, keys(&["id"]))).unwrap();

    assert_eq!(outcome.index.shape(), (1, 1, 1));
    let keys: Vec<String> = outcome.index.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["1", "2", "4"]);

    let alice = outcome.column_diff.get(&DiffKey::single(1.0)).unwrap();
    assert_eq!(alice.left.len(), 1);
    assert_eq!(alice.left["age"], CellValue::Float(30.0));
    assert_eq!(alice.right["age"], CellValue::Float(31.0));

    let bob = outcome.index.get(&DiffKey::single(2.0)).unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].origin, Origin::Left);

    let dave = outcome.index.get(&DiffKey::single(4.0)).unwrap();
    assert_eq!(dave[0].origin, Origin::Right);

    assert!(outcome.validation.is_clean());
}

#[test]
fn test_report_marks_changed_fields() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, keys(&["id"]))).unwrap();
    let alice = outcome.report.find("1").unwrap();
    assert_eq!(alice.rows.len(), 2);
    for row in &alice.rows {
        assert_eq!(row.changed_columns(), vec!["age"]);
        let name = row.fields.iter().find(|f| f.name == "name").unwrap();
        assert_eq!(name.status, FieldStatus::Unchanged);
    }
    assert_eq!(outcome.report.key_columns, vec!["id".to_string()]);
    assert_eq!(outcome.report.headers, vec!["id", "name", "age"]);
}

#[test]
fn test_identical_files_have_no_differences() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("a.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("b.csv", &sample_data::people_left()).unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, keys(&["id"]))).unwrap();
    assert!(outcome.index.is_empty());
    assert!(outcome.column_diff.is_empty());
    assert!(!outcome.report.has_differences());
}

#[test]
fn test_identity_key_compares_by_position() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("a.csv", "name\nx\ny\nz\n").unwrap();
    let right = fixture.create_csv_raw("b.csv", "name\nx\nq\nz\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, keys(&["row_id"]))).unwrap();
    assert_eq!(outcome.index.len(), 1);
    let changes = outcome.column_diff.get(&DiffKey::single(2i64)).unwrap();
    assert_eq!(changes.left["name"], CellValue::String("y".into()));
    assert_eq!(changes.right["name"], CellValue::String("q".into()));
}

#[test]
fn test_line_no_key_with_default_exclusions() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("a.csv", "name\na\nb\n").unwrap();
    let right = fixture.create_csv_raw("b.csv", "name\na\nc\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, keys(&["line_no"]))).unwrap();
    assert_eq!(outcome.index.len(), 1);
    assert!(outcome.index.columns().contains(&"line_no".to_string()));
    assert!(!outcome.index.columns().contains(&"file_name".to_string()));
    let changes = outcome.column_diff.get(&DiffKey::single(2i64)).unwrap();
    assert_eq!(changes.left["name"], CellValue::String("b".into()));
    assert_eq!(changes.right["name"], CellValue::String("c".into()));
}

#[test]
fn test_missing_key_column_fails() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();

    let err = compare_files(&CompareRequest::new(&left, &right, keys(&["code"]))).unwrap_err();
    assert!(matches!(err, CsvdiffError::SchemaMismatch { .. }));
}

#[test]
fn test_empty_key_list_fails() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();

    let err = compare_files(&CompareRequest::new(&left, &right, Vec::new())).unwrap_err();
    assert!(matches!(err, CsvdiffError::DiffConfig { .. }));
}

#[test]
fn test_excluded_column_is_ignored() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let right = fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();

    let mut request = CompareRequest::new(&left, &right, keys(&["id"]));
    request.excluded_columns = Some(keys(&["age", "file_name", "line_no"]));
    let outcome = compare_files(&request).unwrap();
    assert_eq!(outcome.index.shape(), (0, 1, 1));
    assert!(!outcome.index.columns().contains(&"age".to_string()));
}

#[test]
fn test_cli_compare_pretty_and_json() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    fixture.create_csv("right.csv", &sample_data::people_right()).unwrap();
    let left = fixture.path_str("left.csv");
    let right = fixture.path_str("right.csv");

    runner.expect_success(&["compare", "-f", &left, &right, "-k", "id"]);

    let output = fixture.path_str("report.json");
    runner.expect_success(&[
        "compare", "-f", &left, &right, "-k", "id", "--format", "json", "--output", &output,
    ]);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["keys"].as_array().unwrap().len(), 3);
    assert_eq!(json["keys"][0]["key"], "1");
    assert_eq!(json["keys"][0]["rows"][1]["origin"], "RIGHT");
}

#[test]
fn test_cli_compare_with_settings_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_csv_raw("left.csv", "id;amount\n1;3,5\n2;4\n").unwrap();
    fixture.create_csv_raw("right.csv", "id;amount\n1;3,5\n2;5\n").unwrap();
    fixture
        .create_csv_raw(
            "csvdiff.json",
            r#"{"key_columns": ["id"], "delimiter": ";", "format": "json"}"#,
        )
        .unwrap();

    let output = fixture.path_str("out.json");
    runner.expect_success(&[
        "compare",
        "-f", &fixture.path_str("left.csv"), &fixture.path_str("right.csv"),
        "--config", &fixture.path_str("csvdiff.json"),
        "--output", &output,
    ]);
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["keys"].as_array().unwrap().len(), 1);
    assert_eq!(json["keys"][0]["key"], "2");
}

#[test]
fn test_cli_compare_failures() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    let left = fixture.path_str("left.csv");

    // memory mode needs two files
    let err = runner.expect_failure(&["compare", "-f", &left, "-k", "id"]);
    assert!(matches!(err, CsvdiffError::DiffConfig { .. }));

    // missing file
    let missing = fixture.path_str("missing.csv");
    let err = runner.expect_failure(&["compare", "-f", &left, &missing, "-k", "id"]);
    assert!(matches!(err, CsvdiffError::Read { .. }));

    // unknown mode
    let err = runner.expect_failure(&["compare", "-f", &left, &left, "-m", "cloud", "-k", "id"]);
    assert!(matches!(err, CsvdiffError::InvalidInput { .. }));

    // bad policy
    let err = runner.expect_failure(&[
        "compare", "-f", &left, &left, "-k", "id", "--on-type-mismatch", "coerce",
    ]);
    assert!(matches!(err, CsvdiffError::InvalidInput { .. }));
}

#[test]
fn test_cli_validate_and_schema() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_csv("left.csv", &sample_data::people_left()).unwrap();
    fixture.create_csv_raw("orders.csv", sample_data::ORDERS_V1).unwrap();

    runner.expect_success(&[
        "validate",
        &fixture.path_str("left.csv"),
        &fixture.path_str("orders.csv"),
    ]);
    runner.expect_success(&["schema", &fixture.path_str("orders.csv")]);
    runner.expect_success(&["schema", &fixture.path_str("orders.csv"), "--format", "json"]);

    let err = runner.expect_failure(&["schema", &fixture.path_str("orders.csv"), "--format", "xml"]);
    assert!(matches!(err, CsvdiffError::InvalidInput { .. }));
}
