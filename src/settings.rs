//! Optional JSON settings file for the CLI
//!
//! ```json
//! { "key_columns": ["row_id"], "on_type_mismatch": "skip_row", "delimiter": ";" }
//! ```
//!
//! Values given on the command line take precedence.

use crate::cli::delimiter_byte;
use crate::error::{CsvdiffError, Result};
use crate::reader::MismatchPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub key_columns: Vec<String>,
    pub excluded_columns: Option<Vec<String>>,
    pub on_type_mismatch: Option<MismatchPolicy>,
    pub delimiter: Option<char>,
    pub ignored: Vec<String>,
    pub format: Option<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CsvdiffError::settings(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            CsvdiffError::settings(format!("Invalid settings in '{}': {}", path.display(), e))
        })?;
        settings.delimiter_byte()?;
        log::debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Delimiter as a single byte, if one is configured
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .map(delimiter_byte)
            .transpose()
            .map_err(CsvdiffError::settings)
    }
}
