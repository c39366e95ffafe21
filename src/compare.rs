//! End-to-end comparison: read, validate, load, diff, extract, report

use crate::column_diff::{extract_column_diffs, ColumnDiff};
use crate::diff::{DiffConfig, DiffIndex, TableDiff};
use crate::error::{CsvdiffError, Result};
use crate::reader::{Dataset, ReaderOptions, TypedReader};
use crate::report::ComparisonReport;
use crate::store::Store;
use crate::validation::{analyze, ValidationReport};
use std::path::{Path, PathBuf};

/// Two CSV files compared in a fresh in-memory store
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_table: Option<String>,
    pub right_table: Option<String>,
    pub key_columns: Vec<String>,
    pub excluded_columns: Option<Vec<String>>,
    pub reader: ReaderOptions,
}

impl CompareRequest {
    pub fn new(left: impl Into<PathBuf>, right: impl Into<PathBuf>, key_columns: Vec<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            left_table: None,
            right_table: None,
            key_columns,
            excluded_columns: None,
            reader: ReaderOptions::default(),
        }
    }

    /// Table labels, defaulting to the file stems
    pub fn table_names(&self) -> Result<(String, String)> {
        let left = match &self.left_table {
            Some(name) => name.clone(),
            None => table_name_for(&self.left)?,
        };
        let right = match &self.right_table {
            Some(name) => name.clone(),
            None => table_name_for(&self.right)?,
        };
        if left == right {
            if self.left_table.is_some() && self.right_table.is_some() {
                return Err(CsvdiffError::diff_config(format!(
                    "table names must differ, both are '{}'",
                    left
                )));
            }
            return Ok((format!("{}_1", left), format!("{}_2", right)));
        }
        Ok((left, right))
    }
}

/// Everything produced by one file comparison
#[derive(Debug)]
pub struct ComparisonOutcome {
    pub left: Dataset,
    pub right: Dataset,
    pub validation: ValidationReport,
    pub index: DiffIndex,
    pub column_diff: ColumnDiff,
    pub report: ComparisonReport,
}

/// Run the whole pipeline for two files
pub fn compare_files(request: &CompareRequest) -> Result<ComparisonOutcome> {
    let (left_table, right_table) = request.table_names()?;
    let mut config = DiffConfig::memory(&left_table, &right_table, request.key_columns.clone())?;
    if let Some(excluded) = &request.excluded_columns {
        config = config.with_excluded_columns(excluded.clone())?;
    }

    let reader = TypedReader::new(request.reader.clone());
    let left = reader.read_path(&request.left)?;
    let right = reader.read_path(&request.right)?;
    let validation = analyze(&[&left, &right]);

    let mut store = Store::open_in_memory()?;
    store.load_dataset(&left, &left_table)?;
    store.load_dataset(&right, &right_table)?;

    let index = config
        .run(Some(&store))?
        .pop()
        .map(|d| d.index)
        .ok_or_else(|| CsvdiffError::sql_diff("memory diff produced no result"))?;
    let column_diff = extract_column_diffs(&index);
    let report = ComparisonReport::build(
        left.source(),
        right.source(),
        &index,
        &column_diff,
        &validation,
    );

    Ok(ComparisonOutcome {
        left,
        right,
        validation,
        index,
        column_diff,
        report,
    })
}

/// Run a database mode configuration and build a report per differing table
pub fn compare_databases(config: &DiffConfig) -> Result<Vec<(TableDiff, ComparisonReport)>> {
    let diffs = config.run(None)?;
    Ok(diffs
        .into_iter()
        .map(|table_diff| {
            let column_diff = extract_column_diffs(&table_diff.index);
            let left = qualified_label(&table_diff.database, &table_diff.left_table);
            let right = qualified_label(&table_diff.database, &table_diff.right_table);
            let report = ComparisonReport::build(
                left,
                right,
                &table_diff.index,
                &column_diff,
                &ValidationReport::default(),
            );
            (table_diff, report)
        })
        .collect())
}

fn qualified_label(database: &Option<String>, table: &str) -> String {
    match database {
        Some(db) => format!("{}:{}", db, table),
        None => table.to_string(),
    }
}

/// Default table label for a file: its stem
pub fn table_name_for(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            CsvdiffError::invalid_input(format!("cannot derive a table name from '{}'", path.display()))
        })
}
