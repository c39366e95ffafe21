//! DuckDB backing store for datasets under comparison

use crate::error::{CsvdiffError, Result};
use crate::reader::{Dataset, FILE_NAME_COLUMN, IDENTITY_COLUMN, LINE_NO_COLUMN};
use crate::value::{CellValue, ColumnType};
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, Value};
use duckdb::{params, params_from_iter, Connection};
use std::fmt;
use std::path::Path;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A table, optionally inside an attached database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            name: name.into(),
        }
    }

    pub fn in_database(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            name: name.into(),
        }
    }

    /// Quoted name usable in a FROM clause
    pub fn qualified(&self) -> String {
        match &self.database {
            Some(db) => format!("{}.main.{}", quote_ident(db), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}", db, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Column metadata read from the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreColumn {
    pub name: String,
    pub data_type: String,
}

/// Owns one DuckDB connection. Never shared between comparisons.
pub struct Store {
    connection: Connection,
}

impl Store {
    /// Fresh in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to open in-memory store: {}", e)))?;
        Ok(Self { connection })
    }

    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path).map_err(|e| {
            CsvdiffError::sql_diff(format!("Failed to open database '{}': {}", path.display(), e))
        })?;
        Ok(Self { connection })
    }

    /// Materialize a dataset as a table with an identity column, one column
    /// per schema entry and the provenance columns.
    pub fn load_dataset(&mut self, dataset: &Dataset, table: &str) -> Result<()> {
        let sequence = format!("{}_row_id_seq", sanitize(table));
        let mut column_defs = vec![format!(
            "{} BIGINT PRIMARY KEY DEFAULT nextval('{}')",
            quote_ident(IDENTITY_COLUMN),
            sequence
        )];
        let mut insert_columns = Vec::new();
        let mut placeholders = Vec::new();

        for (name, column_type) in dataset.schema() {
            column_defs.push(format!("{} {}", quote_ident(name), column_type.sql_type()));
            insert_columns.push(quote_ident(name));
            placeholders.push(match column_type {
                ColumnType::String => "?".to_string(),
                other => format!("CAST(? AS {})", other.sql_type()),
            });
        }
        column_defs.push(format!("{} VARCHAR", quote_ident(FILE_NAME_COLUMN)));
        column_defs.push(format!("{} BIGINT", quote_ident(LINE_NO_COLUMN)));
        insert_columns.push(quote_ident(FILE_NAME_COLUMN));
        insert_columns.push(quote_ident(LINE_NO_COLUMN));
        placeholders.push("?".to_string());
        placeholders.push("CAST(? AS BIGINT)".to_string());

        let create_sql = format!(
            "CREATE SEQUENCE {} START 1; CREATE TABLE {} ({});",
            quote_ident(&sequence),
            quote_ident(table),
            column_defs.join(", ")
        );
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            insert_columns.join(", "),
            placeholders.join(", ")
        );
        log::debug!("{}", create_sql);

        let tx = self
            .connection
            .transaction()
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to begin load of '{}': {}", table, e)))?;
        tx.execute_batch(&create_sql)
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to create table '{}': {}", table, e)))?;
        {
            let mut stmt = tx.prepare(&insert_sql).map_err(|e| {
                CsvdiffError::sql_diff(format!("Failed to prepare insert into '{}': {}", table, e))
            })?;
            for row in dataset.rows() {
                let values: Vec<Option<String>> =
                    row.fields().values().map(CellValue::to_sql_text).collect();
                stmt.execute(params_from_iter(values)).map_err(|e| {
                    CsvdiffError::sql_diff(format!(
                        "Failed to insert line {} into '{}': {}",
                        row.line_no().unwrap_or_default(),
                        table,
                        e
                    ))
                })?;
            }
        }
        tx.commit()
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to commit load of '{}': {}", table, e)))?;

        log::info!(
            "Loaded {} rows from {} into table '{}'",
            dataset.row_count(),
            dataset.source(),
            table
        );
        Ok(())
    }

    /// Attach another database file read-only under `alias`
    pub fn attach(&self, path: &Path, alias: &str) -> Result<()> {
        let sql = format!(
            "ATTACH {} AS {} (READ_ONLY)",
            quote_literal(&path.to_string_lossy()),
            quote_ident(alias)
        );
        self.connection.execute_batch(&sql).map_err(|e| {
            CsvdiffError::sql_diff(format!("Failed to attach '{}' as {}: {}", path.display(), alias, e))
        })
    }

    /// Tables of the main schema of `database` (the connection's own when `None`)
    pub fn table_names(&self, database: Option<&str>) -> Result<Vec<String>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT table_name FROM duckdb_tables()
                 WHERE database_name = COALESCE(?, current_database()) AND schema_name = 'main'
                 ORDER BY table_name",
            )
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to prepare table listing: {}", e)))?;
        let rows = stmt
            .query_map(params![database], |row| row.get::<_, String>(0))
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to list tables: {}", e)))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row.map_err(|e| CsvdiffError::sql_diff(format!("Failed to read table name: {}", e)))?);
        }
        Ok(names)
    }

    /// Column names and declared types in table order
    pub fn columns(&self, table: &TableRef) -> Result<Vec<StoreColumn>> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT column_name, data_type FROM duckdb_columns()
                 WHERE database_name = COALESCE(?, current_database())
                   AND schema_name = 'main' AND table_name = ?
                 ORDER BY column_index",
            )
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to prepare column query: {}", e)))?;
        let rows = stmt
            .query_map(params![table.database.as_deref(), table.name.as_str()], |row| {
                Ok(StoreColumn {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                })
            })
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to query columns of '{}': {}", table, e)))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| {
                CsvdiffError::sql_diff(format!("Failed to read column of '{}': {}", table, e))
            })?);
        }
        Ok(columns)
    }

    /// Run a query and convert every row into `column_count` cells
    pub fn query_rows(&self, sql: &str, column_count: usize) -> Result<Vec<Vec<CellValue>>> {
        log::debug!("{}", sql);
        let mut stmt = self
            .connection
            .prepare(sql)
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to prepare diff query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| {
                let mut cells = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    cells.push(cell_from_value(row.get::<_, Value>(i)?));
                }
                Ok(cells)
            })
            .map_err(|e| CsvdiffError::sql_diff(format!("Failed to execute diff query: {}", e)))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| CsvdiffError::sql_diff(format!("Failed to read diff row: {}", e)))?);
        }
        Ok(result)
    }
}

/// Convert an owned DuckDB value into a cell
pub fn cell_from_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(b) => CellValue::String(b.to_string()),
        Value::TinyInt(i) => CellValue::Integer(i.into()),
        Value::SmallInt(i) => CellValue::Integer(i.into()),
        Value::Int(i) => CellValue::Integer(i.into()),
        Value::BigInt(i) => CellValue::Integer(i),
        Value::UTinyInt(i) => CellValue::Integer(i.into()),
        Value::USmallInt(i) => CellValue::Integer(i.into()),
        Value::UInt(i) => CellValue::Integer(i.into()),
        Value::UBigInt(i) => match i64::try_from(i) {
            Ok(i) => CellValue::Integer(i),
            Err(_) => CellValue::String(i.to_string()),
        },
        Value::HugeInt(i) => match i64::try_from(i) {
            Ok(i) => CellValue::Integer(i),
            Err(_) => CellValue::String(i.to_string()),
        },
        Value::Float(f) => CellValue::Float(f.into()),
        Value::Double(f) => CellValue::Float(f),
        Value::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => CellValue::Float(f),
            Err(_) => CellValue::String(d.to_string()),
        },
        Value::Text(s) => CellValue::String(s),
        Value::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            DateTime::from_timestamp(secs, nanos)
                .map(|dt| CellValue::DateTime(dt.naive_utc()))
                .unwrap_or(CellValue::Null)
        }
        other => CellValue::String(format!("{:?}", other)),
    }
}

/// Double-quote an identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
