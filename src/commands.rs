//! Command implementations for csvdiff CLI

use crate::cli::{delimiter_byte, Commands, OutputFormat};
use crate::compare::{compare_databases, compare_files, CompareRequest};
use crate::diff::{DiffConfig, DiffMode};
use crate::error::{CsvdiffError, Result};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::reader::{MismatchPolicy, ReaderOptions, TypedReader};
use crate::settings::Settings;
use crate::validation::analyze;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands) -> Result<()> {
    match command {
        Commands::Compare {
            files,
            tables,
            mode,
            ignored,
            path,
            key,
            exclude,
            on_type_mismatch,
            delimiter,
            format,
            output,
            config,
        } => {
            let settings = match &config {
                Some(path) => Settings::load(path)?,
                None => Settings::default(),
            };
            let options = CompareOptions::resolve(
                settings,
                key,
                exclude,
                ignored,
                on_type_mismatch.as_deref(),
                delimiter,
                format.as_deref(),
            )?;
            compare_command(
                &files,
                tables,
                &mode,
                path.as_deref(),
                &options,
                output.as_deref(),
            )
        }
        Commands::Validate {
            first,
            second,
            delimiter,
        } => validate_command(&first, &second, delimiter),
        Commands::Schema {
            input,
            delimiter,
            format,
        } => schema_command(&input, delimiter, &format),
    }
}

/// Command line values merged over the settings file
#[derive(Debug, Clone)]
struct CompareOptions {
    key_columns: Vec<String>,
    excluded_columns: Option<Vec<String>>,
    ignored: Vec<String>,
    reader: ReaderOptions,
    format: OutputFormat,
}

impl CompareOptions {
    fn resolve(
        settings: Settings,
        key: Vec<String>,
        exclude: Option<Vec<String>>,
        mut ignored: Vec<String>,
        on_type_mismatch: Option<&str>,
        delimiter: Option<char>,
        format: Option<&str>,
    ) -> Result<Self> {
        let policy = match on_type_mismatch {
            Some(s) => MismatchPolicy::parse(s).map_err(CsvdiffError::invalid_input)?,
            None => settings.on_type_mismatch.unwrap_or_default(),
        };
        let delimiter = match delimiter {
            Some(c) => delimiter_byte(c).map_err(CsvdiffError::invalid_input)?,
            None => settings.delimiter_byte()?.unwrap_or(b','),
        };
        let format = format
            .or(settings.format.as_deref())
            .map(OutputFormat::parse)
            .transpose()
            .map_err(CsvdiffError::invalid_input)?
            .unwrap_or(OutputFormat::Pretty);
        ignored.extend(settings.ignored);

        Ok(Self {
            key_columns: if key.is_empty() { settings.key_columns } else { key },
            excluded_columns: exclude.or(settings.excluded_columns),
            ignored,
            reader: ReaderOptions {
                delimiter,
                on_type_mismatch: policy,
            },
            format,
        })
    }
}

/// Compare two CSV files or two database locations
fn compare_command(
    files: &[PathBuf],
    tables: Option<Vec<String>>,
    mode: &str,
    base: Option<&Path>,
    options: &CompareOptions,
    output: Option<&Path>,
) -> Result<()> {
    let mode = DiffMode::parse(mode).map_err(CsvdiffError::invalid_input)?;
    let [first, second] = files else {
        return Err(CsvdiffError::diff_config(match mode {
            DiffMode::Memory => "memory mode requires two files to compare",
            DiffMode::Database => "Please provide folders containing database files to compare",
        }));
    };

    let text = match mode {
        DiffMode::Memory => {
            let mut request = CompareRequest::new(first, second, options.key_columns.clone());
            request.excluded_columns = options.excluded_columns.clone();
            request.reader = options.reader.clone();
            if let Some(tables) = tables {
                let mut tables = tables.into_iter();
                request.left_table = tables.next();
                request.right_table = tables.next();
            }

            let mut progress = progress_for(options.format, output);
            progress.start("Comparing files...");
            let outcome = compare_files(&request)?;
            progress.finish(&format!("Compared in {:.2?}", progress.elapsed()));

            for dataset in [&outcome.left, &outcome.right] {
                if !dataset.rejected().is_empty() {
                    log::warn!(
                        "{}: {} rows skipped for type mismatches",
                        dataset.source(),
                        dataset.rejected().len()
                    );
                }
            }
            match options.format {
                OutputFormat::Pretty => PrettyPrinter::render_report(&outcome.report),
                OutputFormat::Json => JsonFormatter::format(&outcome.report)?,
            }
        }
        DiffMode::Database => {
            let origin = resolve_location(first, base);
            let compare = resolve_location(second, base);
            let mut config = DiffConfig::database(origin, compare, options.key_columns.clone())?
                .with_ignored(options.ignored.iter().cloned());
            if let Some(excluded) = &options.excluded_columns {
                config = config.with_excluded_columns(excluded.clone())?;
            }

            let mut progress = progress_for(options.format, output);
            progress.start("Comparing databases...");
            let results = compare_databases(&config)?;
            progress.finish(&format!("Compared in {:.2?}", progress.elapsed()));

            let reports: Vec<_> = results.into_iter().map(|(_, report)| report).collect();
            match options.format {
                OutputFormat::Json => JsonFormatter::format(&reports)?,
                OutputFormat::Pretty if reports.is_empty() => {
                    "✅ No differences found\n".to_string()
                }
                OutputFormat::Pretty => reports
                    .iter()
                    .map(PrettyPrinter::render_report)
                    .collect::<Vec<_>>()
                    .join("\n"),
            }
        }
    };

    write_output(&text, output)
}

/// Print header and row count warnings for two files
fn validate_command(first: &Path, second: &Path, delimiter: char) -> Result<()> {
    let reader = TypedReader::new(ReaderOptions {
        delimiter: delimiter_byte(delimiter).map_err(CsvdiffError::invalid_input)?,
        ..ReaderOptions::default()
    });
    let left = reader.read_path(first)?;
    let right = reader.read_path(second)?;
    let report = analyze(&[&left, &right]);
    print!("{}", PrettyPrinter::render_validation(&report));
    Ok(())
}

/// Print the inferred schema of one file
fn schema_command(input: &Path, delimiter: char, format: &str) -> Result<()> {
    let format = OutputFormat::parse(format).map_err(CsvdiffError::invalid_input)?;
    let reader = TypedReader::new(ReaderOptions {
        delimiter: delimiter_byte(delimiter).map_err(CsvdiffError::invalid_input)?,
        ..ReaderOptions::default()
    });
    let dataset = reader.read_path(input)?;
    match format {
        OutputFormat::Pretty => print!("{}", PrettyPrinter::render_schema(&dataset)),
        OutputFormat::Json => println!("{}", JsonFormatter::format_schema(&dataset)?),
    }
    Ok(())
}

/// No spinner while JSON goes to the terminal
fn progress_for(format: OutputFormat, output: Option<&Path>) -> ProgressReporter {
    match (format, output) {
        (OutputFormat::Json, None) => ProgressReporter::new_minimal(),
        _ => ProgressReporter::new_for_compare(),
    }
}

fn resolve_location(location: &Path, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) if location.is_relative() => base.join(location),
        _ => location.to_path_buf(),
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("📄 Report written to: {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
