//! Presentation data: every differing row with its fields marked changed or unchanged

use crate::column_diff::{ColumnDiff, FieldChanges};
use crate::diff::{DiffIndex, Origin};
use crate::validation::ValidationReport;
use crate::value::CellValue;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReport {
    pub name: String,
    pub value: CellValue,
    pub status: FieldStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    pub origin: Origin,
    pub fields: Vec<FieldReport>,
}

impl RowReport {
    pub fn changed_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.status == FieldStatus::Changed)
            .map(|f| f.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyReport {
    pub key: String,
    pub rows: Vec<RowReport>,
}

/// Everything a renderer needs for one pair of tables
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub left_source: String,
    pub right_source: String,
    pub key_columns: Vec<String>,
    pub headers: Vec<String>,
    pub keys: Vec<KeyReport>,
    pub warnings: Vec<String>,
}

impl ComparisonReport {
    pub fn build(
        left_source: impl Into<String>,
        right_source: impl Into<String>,
        index: &DiffIndex,
        column_diff: &ColumnDiff,
        validation: &ValidationReport,
    ) -> Self {
        let empty = FieldChanges::default();
        let keys = index
            .iter()
            .map(|(key, entries)| {
                let changes = column_diff.get(key).unwrap_or(&empty);
                KeyReport {
                    key: key.to_string(),
                    rows: entries
                        .iter()
                        .map(|entry| RowReport {
                            origin: entry.origin,
                            fields: entry
                                .fields
                                .iter()
                                .map(|(name, value)| FieldReport {
                                    name: name.clone(),
                                    value: value.clone(),
                                    status: if changes.is_changed(name) {
                                        FieldStatus::Changed
                                    } else {
                                        FieldStatus::Unchanged
                                    },
                                })
                                .collect(),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            left_source: left_source.into(),
            right_source: right_source.into(),
            key_columns: index.key_columns().to_vec(),
            headers: index.columns().to_vec(),
            keys,
            warnings: validation.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn has_differences(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn find(&self, key: &str) -> Option<&KeyReport> {
        self.keys.iter().find(|k| k.key == key)
    }
}
