//! Output formatting utilities

use crate::diff::Origin;
use crate::error::Result;
use crate::reader::Dataset;
use crate::report::{ComparisonReport, FieldStatus, RowReport};
use crate::validation::ValidationReport;
use std::fmt::Write as _;

/// Pretty printer for csvdiff output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Render a comparison report as a tree; changed fields are bracketed
    pub fn render_report(report: &ComparisonReport) -> String {
        let mut out = String::new();
        let (changed, left_only, right_only) = report_shape(report);

        let _ = writeln!(
            out,
            "🔍 Comparison: {} → {}",
            report.left_source, report.right_source
        );
        let _ = writeln!(out, "├─ Key: {}", report.key_columns.join(", "));

        if report.has_differences() {
            let _ = writeln!(
                out,
                "├─ ❌ Differing keys: {} (changed: {}, left only: {}, right only: {})",
                report.keys.len(),
                changed,
                left_only,
                right_only
            );
            for (i, key) in report.keys.iter().enumerate() {
                let last_key = i == report.keys.len() - 1;
                let (key_marker, key_indent) = if last_key { ("└─", "   ") } else { ("├─", "│  ") };
                let _ = writeln!(out, "│  {} Key {}", key_marker, key.key);
                for (j, row) in key.rows.iter().enumerate() {
                    let row_marker = if j == key.rows.len() - 1 { "└─" } else { "├─" };
                    let _ = writeln!(
                        out,
                        "│  {}{} {:<5} {}",
                        key_indent,
                        row_marker,
                        row.origin.to_string(),
                        render_row(row)
                    );
                }
            }
        } else {
            let _ = writeln!(out, "├─ ✅ Rows: identical");
        }

        if report.warnings.is_empty() {
            let _ = writeln!(out, "└─ ✅ Validation: clean");
        } else {
            let _ = writeln!(out, "└─ ⚠️  Validation warnings: {}", report.warnings.len());
            for warning in &report.warnings {
                for line in warning.lines() {
                    let _ = writeln!(out, "   {}", line);
                }
            }
        }
        out
    }

    /// Render inferred column types of a dataset
    pub fn render_schema(dataset: &Dataset) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📋 Schema: {}", dataset.source());
        let _ = writeln!(out, "├─ Rows: {}", dataset.row_count());
        if !dataset.rejected().is_empty() {
            let _ = writeln!(out, "├─ Rejected rows: {}", dataset.rejected().len());
        }
        let _ = writeln!(out, "└─ Columns: {}", dataset.header_count());
        let schema = dataset.schema();
        for (i, (name, column_type)) in schema.iter().enumerate() {
            let prefix = if i == schema.len() - 1 { "   └─" } else { "   ├─" };
            let _ = writeln!(out, "{} {}: {}", prefix, name, column_type);
        }
        out
    }

    /// Render the validation text, or a clean marker
    pub fn render_validation(report: &ValidationReport) -> String {
        if report.is_clean() {
            "✅ Files are consistent\n".to_string()
        } else {
            let mut text = report.to_text();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text
        }
    }
}

/// (changed, left only, right only) key counts
fn report_shape(report: &ComparisonReport) -> (usize, usize, usize) {
    report
        .keys
        .iter()
        .fold((0, 0, 0), |(changed, left, right), key| match key.rows.as_slice() {
            [only] if only.origin == Origin::Left => (changed, left + 1, right),
            [_] => (changed, left, right + 1),
            _ => (changed + 1, left, right),
        })
}

fn render_row(row: &RowReport) -> String {
    row.fields
        .iter()
        .map(|field| match field.status {
            FieldStatus::Changed => format!("[{}={}]", field.name, field.value),
            FieldStatus::Unchanged => format!("{}={}", field.name, field.value),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Format a dataset's schema as JSON
    pub fn format_schema(dataset: &Dataset) -> Result<String> {
        let columns: Vec<serde_json::Value> = dataset
            .schema()
            .iter()
            .map(|(name, column_type)| serde_json::json!({ "name": name, "type": column_type }))
            .collect();
        let json = serde_json::json!({
            "source": dataset.source(),
            "row_count": dataset.row_count(),
            "columns": columns,
            "rejected": dataset.rejected(),
        });
        Ok(serde_json::to_string_pretty(&json)?)
    }
}
