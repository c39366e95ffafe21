//! Column types and typed cell values

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Type locked for a column from its first data row.
///
/// There is no integer type: whole numbers are read as `Float`, and
/// `String` is the total fallback that accepts any text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    DateTime,
    Float,
    String,
}

impl ColumnType {
    /// Inference candidates, tried in priority order.
    pub const CANDIDATES: [ColumnType; 4] = [
        ColumnType::Date,
        ColumnType::DateTime,
        ColumnType::Float,
        ColumnType::String,
    ];

    /// Parse raw text with this type's parser.
    pub fn parse(self, raw: &str) -> Option<CellValue> {
        match self {
            ColumnType::Date => {
                // chrono accepts unpadded fields, the format is fixed width
                if raw.len() != 10 {
                    return None;
                }
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .ok()
                    .map(CellValue::Date)
            }
            ColumnType::DateTime => {
                if raw.len() != 19 {
                    return None;
                }
                NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                    .ok()
                    .map(CellValue::DateTime)
            }
            ColumnType::Float => raw
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(CellValue::Float),
            ColumnType::String => Some(CellValue::String(raw.to_string())),
        }
    }

    /// Pick the first candidate whose parser accepts `raw`.
    pub fn infer(raw: &str) -> (ColumnType, CellValue) {
        for candidate in Self::CANDIDATES {
            if let Some(value) = candidate.parse(raw) {
                return (candidate, value);
            }
        }
        (ColumnType::String, CellValue::String(raw.to_string()))
    }

    /// DuckDB column type used when a dataset is materialized
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "TIMESTAMP",
            ColumnType::Float => "DOUBLE",
            ColumnType::String => "VARCHAR",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Date => write!(f, "date"),
            ColumnType::DateTime => write!(f, "datetime"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

/// A single cell.
///
/// `Integer` never comes out of type inference; it carries store generated
/// values such as the identity column and the `line_no` provenance field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    String(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text handed to DuckDB for parameter binding
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Date(d) => Some(d.format(DATE_FORMAT).to_string()),
            CellValue::DateTime(dt) => Some(dt.format(DATETIME_FORMAT).to_string()),
            CellValue::String(s) => Some(s.clone()),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Integer(a), CellValue::Integer(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => a.to_bits() == b.to_bits(),
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_sql_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}
