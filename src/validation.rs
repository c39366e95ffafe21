//! Advisory checks between the datasets being compared

use crate::reader::Dataset;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A non-fatal mismatch between datasets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Column names present in some datasets but not all
    ColumnNames { columns: BTreeSet<String> },
    /// Row counts differ; (source, rows) per dataset
    RowCounts { counts: Vec<(String, usize)> },
    /// Header counts differ; (source, headers) per dataset
    HeaderCounts { counts: Vec<(String, usize)> },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::ColumnNames { columns } => {
                let names: Vec<&str> = columns.iter().map(String::as_str).collect();
                write!(f, "Different column names found: {}.", names.join(", "))
            }
            ValidationWarning::RowCounts { counts } => {
                writeln!(f, "Invalid lines number in provided files found!")?;
                for (source, rows) in counts {
                    writeln!(f, "{} has {} lines", source, rows)?;
                }
                Ok(())
            }
            ValidationWarning::HeaderCounts { counts } => {
                writeln!(f, "Invalid headers number in provided files found!")?;
                for (source, headers) in counts {
                    writeln!(f, "{} has {} headers", source, headers)?;
                }
                Ok(())
            }
        }
    }
}

/// All warnings raised for one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Human readable text, one block per warning; empty when clean
    pub fn to_text(&self) -> String {
        self.warnings
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compare header sets, row counts and header counts
pub fn analyze(datasets: &[&Dataset]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(first) = datasets.first() else {
        return report;
    };

    let differing: BTreeSet<String> = datasets
        .iter()
        .flat_map(|d| d.headers())
        .filter(|h| datasets.iter().any(|d| !d.schema().contains_key(*h)))
        .map(String::from)
        .collect();
    if !differing.is_empty() {
        report
            .warnings
            .push(ValidationWarning::ColumnNames { columns: differing });
    }

    if datasets.iter().any(|d| d.row_count() != first.row_count()) {
        report.warnings.push(ValidationWarning::RowCounts {
            counts: datasets
                .iter()
                .map(|d| (d.source().to_string(), d.row_count()))
                .collect(),
        });
    }

    if datasets.iter().any(|d| d.header_count() != first.header_count()) {
        report.warnings.push(ValidationWarning::HeaderCounts {
            counts: datasets
                .iter()
                .map(|d| (d.source().to_string(), d.header_count()))
                .collect(),
        });
    }

    for warning in &report.warnings {
        log::warn!("{}", warning.to_string().trim_end());
    }
    report
}
