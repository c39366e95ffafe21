//! Error types for csvdiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CsvdiffError>;

#[derive(Error, Debug)]
pub enum CsvdiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Error in parsing file: {source_name}, please check file format: {message}")]
    Read {
        source_name: String,
        message: String,
    },

    #[error("Diff configuration error: {message}")]
    DiffConfig { message: String },

    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    #[error("SQL diff error: {message}")]
    SqlDiff { message: String },

    #[error("Duplicate {origin} rows for key ({key})")]
    DuplicateKey { key: String, origin: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl CsvdiffError {
    pub fn read(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Read {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    pub fn diff_config(msg: impl Into<String>) -> Self {
        Self::DiffConfig {
            message: msg.into(),
        }
    }

    pub fn schema_mismatch(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: msg.into(),
        }
    }

    pub fn sql_diff(msg: impl Into<String>) -> Self {
        Self::SqlDiff {
            message: msg.into(),
        }
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
