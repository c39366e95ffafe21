//! Command-line interface for csvdiff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "csvdiff")]
#[command(about = "Typed, key based comparison of CSV files and database tables")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two CSV files, or two sets of database files
    Compare {
        /// Files to compare (two CSV files, or origin/compare database locations)
        #[arg(short, long, num_args = 1..=2, required = true)]
        files: Vec<PathBuf>,

        /// Table names for the two sides (default: file stems)
        #[arg(short, long, num_args = 2)]
        tables: Option<Vec<String>>,

        /// Comparison mode: "memory" or "database"
        #[arg(short, long, default_value = "memory")]
        mode: String,

        /// Database file names to skip in database mode
        #[arg(short, long, num_args = 1..)]
        ignored: Vec<String>,

        /// Base directory for relative database locations
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Key columns identifying a row
        #[arg(short, long, num_args = 1..)]
        key: Vec<String>,

        /// Columns left out of the comparison (default: file_name line_no)
        #[arg(long, num_args = 0..)]
        exclude: Option<Vec<String>>,

        /// Rows not matching the inferred types: "fail" or "skip"
        #[arg(long)]
        on_type_mismatch: Option<String>,

        /// Field delimiter
        #[arg(long)]
        delimiter: Option<char>,

        /// Output format: "pretty", "json"
        #[arg(long)]
        format: Option<String>,

        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// JSON settings file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Report header and row count mismatches between two CSV files
    Validate {
        /// First file
        first: PathBuf,

        /// Second file
        second: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },

    /// Show the inferred column types of a CSV file
    Schema {
        /// Input file
        input: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Delimiter as a byte; only ASCII delimiters are accepted
pub fn delimiter_byte(c: char) -> Result<u8, String> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(format!("Invalid delimiter: '{}'. Must be a single ASCII character", c))
    }
}
