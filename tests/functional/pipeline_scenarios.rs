//! Functional scenarios covering reading, alignment, diffing and extraction together

use crate::common::TestFixture;
use csvdiff::align::{align, Projection};
use csvdiff::compare::{compare_files, CompareRequest};
use csvdiff::validation::ValidationWarning;
use csvdiff::{CellValue, DiffKey, Origin};

fn id_key() -> Vec<String> {
    vec!["id".to_string()]
}

#[test]
fn test_changed_age_scenario() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("left.csv", "id,name,age\n1,Alice,30\n").unwrap();
    let right = fixture.create_csv_raw("right.csv", "id,name,age\n1,Alice,31\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, id_key())).unwrap();
    let key = DiffKey::single(1.0);

    let entries = outcome.index.get(&key).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].origin, Origin::Left);
    assert_eq!(entries[1].origin, Origin::Right);

    let changes = outcome.column_diff.get(&key).unwrap();
    assert_eq!(changes.left.len(), 1);
    assert_eq!(changes.right.len(), 1);
    assert_eq!(changes.left["age"], CellValue::Float(30.0));
    assert_eq!(changes.right["age"], CellValue::Float(31.0));
    assert!(!changes.is_changed("name"));
}

#[test]
fn test_left_only_row_scenario() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("left.csv", "id,x\n1,1\n2,5\n").unwrap();
    let right = fixture.create_csv_raw("right.csv", "id,x\n1,1\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, id_key())).unwrap();
    let key = DiffKey::single(2.0);

    let entries = outcome.index.get(&key).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].origin, Origin::Left);

    let changes = outcome.column_diff.get(&key).unwrap();
    assert_eq!(changes.left.len(), 1);
    assert_eq!(changes.left["x"], CellValue::Float(5.0));
    assert!(changes.right.is_empty());
}

#[test]
fn test_differing_column_sets_scenario() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("left.csv", "id,a,b\n1,x,y\n2,p,q\n").unwrap();
    let right = fixture.create_csv_raw("right.csv", "id,a,c\n1,x,z\n2,p,q\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, id_key())).unwrap();
    assert_eq!(outcome.index.columns(), &["id", "a", "b", "c"].map(String::from));

    // every row differs in the nulled columns
    assert_eq!(outcome.index.shape(), (2, 0, 0));
    let changes = outcome.column_diff.get(&DiffKey::single(1.0)).unwrap();
    assert_eq!(changes.left["b"], CellValue::String("y".into()));
    assert_eq!(changes.left["c"], CellValue::Null);
    assert_eq!(changes.right["b"], CellValue::Null);
    assert_eq!(changes.right["c"], CellValue::String("z".into()));
    assert!(!changes.is_changed("a"));

    match &outcome.validation.warnings[..] {
        [ValidationWarning::ColumnNames { columns }] => {
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            assert_eq!(names, vec!["b", "c"]);
        }
        other => panic!("unexpected warnings: {other:?}"),
    }
}

#[test]
fn test_alignment_properties() {
    let aligned = align(&["a", "b"], &["b", "c"]);
    assert_eq!(
        aligned.left,
        vec![
            Projection::Column("a".into()),
            Projection::Column("b".into()),
            Projection::Null("c".into()),
        ]
    );
    assert_eq!(
        aligned.right,
        vec![
            Projection::Null("a".into()),
            Projection::Column("b".into()),
            Projection::Column("c".into()),
        ]
    );

    let same = align(&["a", "b"], &["a", "b"]);
    assert_eq!(same.left, same.right);
    assert!(!same.has_placeholders());
}

#[test]
fn test_every_differing_key_has_one_or_two_entries() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture
        .create_csv_raw("left.csv", "id,v\n1,a\n2,b\n3,c\n4,d\n")
        .unwrap();
    let right = fixture
        .create_csv_raw("right.csv", "id,v\n2,b\n3,x\n4,d\n5,e\n")
        .unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, id_key())).unwrap();
    for (_, entries) in outcome.index.iter() {
        assert!((1..=2).contains(&entries.len()));
    }
    let keys: Vec<String> = outcome.index.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["1", "3", "5"]);
    assert!(outcome.index.get(&DiffKey::single(2.0)).is_none());
    assert!(outcome.index.get(&DiffKey::single(4.0)).is_none());
    assert_eq!(outcome.column_diff.len(), 3);
}

#[test]
fn test_composite_key() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture
        .create_csv_raw("left.csv", "region,id,v\neu,1,a\nus,1,b\n")
        .unwrap();
    let right = fixture
        .create_csv_raw("right.csv", "region,id,v\neu,1,a\nus,1,c\n")
        .unwrap();

    let request = CompareRequest::new(&left, &right, vec!["region".into(), "id".into()]);
    let outcome = compare_files(&request).unwrap();
    let key = DiffKey(vec![CellValue::String("us".into()), CellValue::Float(1.0)]);
    assert_eq!(outcome.index.get(&key).unwrap().len(), 2);
    assert_eq!(key.to_string(), "us, 1");
    assert!(outcome.report.find("us, 1").is_some());
}

#[test]
fn test_validation_warnings_do_not_block_diff() {
    let fixture = TestFixture::new().unwrap();
    let left = fixture.create_csv_raw("left.csv", "id,v\n1,a\n2,b\n").unwrap();
    let right = fixture.create_csv_raw("right.csv", "id,v,w\n1,a,z\n").unwrap();

    let outcome = compare_files(&CompareRequest::new(&left, &right, id_key())).unwrap();
    assert_eq!(outcome.validation.warnings.len(), 3);
    assert_eq!(outcome.report.warnings.len(), 3);
    assert!(outcome.report.has_differences());
}
