//! Typed CSV reader with first-row type inference

use crate::error::{CsvdiffError, Result};
use crate::value::{CellValue, ColumnType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Identity column added when a dataset is loaded into the store
pub const IDENTITY_COLUMN: &str = "row_id";
/// Provenance field holding the source identifier
pub const FILE_NAME_COLUMN: &str = "file_name";
/// Provenance field holding the 1-based data row number
pub const LINE_NO_COLUMN: &str = "line_no";

pub const RESERVED_COLUMNS: [&str; 3] = [IDENTITY_COLUMN, FILE_NAME_COLUMN, LINE_NO_COLUMN];

/// What to do with a row that does not fit the locked schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Reject the whole source
    #[default]
    FailFast,
    /// Quarantine the row and keep reading
    SkipRow,
}

impl MismatchPolicy {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fail" | "fail_fast" => Ok(Self::FailFast),
            "skip" | "skip_row" => Ok(Self::SkipRow),
            _ => Err(format!("Invalid type mismatch policy: {}. Use 'fail' or 'skip'", s)),
        }
    }
}

/// Reader settings
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub on_type_mismatch: MismatchPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            on_type_mismatch: MismatchPolicy::FailFast,
        }
    }
}

/// One parsed data row: typed columns in header order, then provenance fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    fields: IndexMap<String, CellValue>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }

    pub fn fields(&self) -> &IndexMap<String, CellValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn source(&self) -> Option<&str> {
        match self.fields.get(FILE_NAME_COLUMN) {
            Some(CellValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn line_no(&self) -> Option<i64> {
        match self.fields.get(LINE_NO_COLUMN) {
            Some(CellValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}

/// A row dropped under [`MismatchPolicy::SkipRow`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line_no: usize,
    pub reason: String,
}

/// A fully read source. Never exists in a partially read state.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: String,
    schema: IndexMap<String, ColumnType>,
    rows: Vec<Row>,
    rejected: Vec<RejectedRow>,
}

impl Dataset {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn schema(&self) -> &IndexMap<String, ColumnType> {
        &self.schema
    }

    pub fn headers(&self) -> Vec<&str> {
        self.schema.keys().map(String::as_str).collect()
    }

    pub fn header_count(&self) -> usize {
        self.schema.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rejected(&self) -> &[RejectedRow] {
        &self.rejected
    }
}

/// Reads delimited text into a [`Dataset`]
#[derive(Debug, Clone, Default)]
pub struct TypedReader {
    options: ReaderOptions,
}

impl TypedReader {
    pub fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    /// Read a file; the path as given becomes the source identifier
    pub fn read_path(&self, path: &Path) -> Result<Dataset> {
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|e| CsvdiffError::read(&source_name, e.to_string()))?;
        self.read_from(&source_name, BufReader::new(file))
    }

    /// Read any byte source under the given source identifier
    pub fn read_from<R: Read>(&self, source_name: &str, input: R) -> Result<Dataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        let mut records = csv_reader.records();

        let header = match records.next() {
            Some(record) => record.map_err(|e| CsvdiffError::read(source_name, e.to_string()))?,
            None => return Err(CsvdiffError::read(source_name, "missing header line")),
        };
        let headers = validate_headers(source_name, header.iter())?;

        let mut types: Option<Vec<ColumnType>> = None;
        let mut rows = Vec::new();
        let mut rejected = Vec::new();

        for (idx, record) in records.enumerate() {
            let line_no = idx + 1;
            let record = record.map_err(|e| CsvdiffError::read(source_name, e.to_string()))?;

            let parsed = if record.len() != headers.len() {
                Err(format!(
                    "line {}: expected {} columns, found {}",
                    line_no,
                    headers.len(),
                    record.len()
                ))
            } else {
                let locked = types.get_or_insert_with(|| {
                    let inferred: Vec<ColumnType> =
                        record.iter().map(|raw| ColumnType::infer(raw).0).collect();
                    log::debug!("{}: locked column types {:?}", source_name, inferred);
                    inferred
                });
                parse_record(&headers, locked, &record, line_no)
            };

            match parsed {
                Ok(mut fields) => {
                    fields.insert(FILE_NAME_COLUMN.to_string(), CellValue::String(source_name.to_string()));
                    fields.insert(LINE_NO_COLUMN.to_string(), CellValue::Integer(line_no as i64));
                    rows.push(Row { fields });
                }
                Err(reason) => match self.options.on_type_mismatch {
                    MismatchPolicy::FailFast => return Err(CsvdiffError::read(source_name, reason)),
                    MismatchPolicy::SkipRow => {
                        log::warn!("{}: skipping row, {}", source_name, reason);
                        rejected.push(RejectedRow { line_no, reason });
                    }
                },
            }
        }

        let types = types.unwrap_or_else(|| vec![ColumnType::String; headers.len()]);
        let schema: IndexMap<String, ColumnType> = headers.into_iter().zip(types).collect();

        log::info!(
            "Read {} rows ({} columns) from {}",
            rows.len(),
            schema.len(),
            source_name
        );

        Ok(Dataset {
            source: source_name.to_string(),
            schema,
            rows,
            rejected,
        })
    }
}

/// Read a file with default options
pub fn read(path: &Path) -> Result<Dataset> {
    TypedReader::default().read_path(path)
}

fn validate_headers<'a>(
    source_name: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<Vec<String>> {
    // store identifiers are case-insensitive, so names are too
    let mut headers: Vec<String> = Vec::new();
    for name in names {
        if RESERVED_COLUMNS.iter().any(|r| r.eq_ignore_ascii_case(name)) {
            return Err(CsvdiffError::read(
                source_name,
                format!("column name '{}' is reserved", name),
            ));
        }
        if headers.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            return Err(CsvdiffError::read(
                source_name,
                format!("duplicate column name '{}'", name),
            ));
        }
        headers.push(name.to_string());
    }
    Ok(headers)
}

fn parse_record(
    headers: &[String],
    types: &[ColumnType],
    record: &csv::StringRecord,
    line_no: usize,
) -> std::result::Result<IndexMap<String, CellValue>, String> {
    let mut fields = IndexMap::with_capacity(headers.len() + 2);
    for ((name, column_type), raw) in headers.iter().zip(types).zip(record.iter()) {
        let value = column_type.parse(raw).ok_or_else(|| {
            format!(
                "line {}: value '{}' in column '{}' is not a valid {}",
                line_no, raw, name, column_type
            )
        })?;
        fields.insert(name.clone(), value);
    }
    Ok(fields)
}
