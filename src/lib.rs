//! # csvdiff
//!
//! Typed comparison of CSV files. Each file is read with per column type
//! inference, loaded into DuckDB and compared with set difference queries
//! keyed on user chosen columns. The result is reduced to the fields that
//! actually differ per key, alongside advisory header and row count checks.

pub mod align;
pub mod cli;
pub mod column_diff;
pub mod commands;
pub mod compare;
pub mod diff;
pub mod error;
pub mod output;
pub mod progress;
pub mod reader;
pub mod report;
pub mod settings;
pub mod store;
pub mod validation;
pub mod value;

pub use column_diff::{extract_column_diffs, ColumnDiff, FieldChanges};
pub use compare::{compare_files, CompareRequest, ComparisonOutcome};
pub use diff::{DiffConfig, DiffEntry, DiffIndex, DiffKey, Origin};
pub use error::{CsvdiffError, Result};
pub use reader::{Dataset, MismatchPolicy, ReaderOptions, TypedReader};
pub use store::Store;
pub use value::{CellValue, ColumnType};
