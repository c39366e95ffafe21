//! Key-indexed symmetric row difference between two stored tables
//!
//! Both sides are projected through [`align`] and compared with two passes
//! of `EXCEPT`: rows of the left table missing from the right one (tagged
//! [`Origin::Left`]), then rows of the right table missing from the left one
//! (tagged [`Origin::Right`]). The resulting rows are grouped by the
//! configured key columns into a [`DiffIndex`].

use crate::align::{align, AlignedSchema, Projection};
use crate::error::{CsvdiffError, Result};
use crate::reader::{FILE_NAME_COLUMN, IDENTITY_COLUMN, LINE_NO_COLUMN};
use crate::store::{quote_ident, Store, StoreColumn, TableRef};
use crate::value::CellValue;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Alias under which the compared database is attached in database mode
pub const DEFAULT_ATTACH_ALIAS: &str = "second";

/// File extensions recognised as database files in database mode
pub const DATABASE_EXTENSIONS: [&str; 3] = ["duckdb", "ddb", "db"];

/// Side a diff row comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Origin {
    Left,
    Right,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Left => write!(f, "LEFT"),
            Origin::Right => write!(f, "RIGHT"),
        }
    }
}

/// A row present on one side with no fully equal row on the other side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub origin: Origin,
    pub fields: IndexMap<String, CellValue>,
}

/// Values of the key columns for one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiffKey(pub Vec<CellValue>);

impl DiffKey {
    pub fn single(value: impl Into<CellValue>) -> Self {
        Self(vec![value.into()])
    }
}

impl fmt::Display for DiffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl Serialize for DiffKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Diff rows grouped by key: one or two entries per key, at most one per side,
/// LEFT before RIGHT.
#[derive(Debug, Clone, Serialize)]
pub struct DiffIndex {
    key_columns: Vec<String>,
    columns: Vec<String>,
    entries: IndexMap<DiffKey, Vec<DiffEntry>>,
}

impl DiffIndex {
    pub fn new(key_columns: Vec<String>, columns: Vec<String>) -> Self {
        Self {
            key_columns,
            columns,
            entries: IndexMap::new(),
        }
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    /// Aligned column names every entry carries
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn key_of(&self, fields: &IndexMap<String, CellValue>) -> Result<DiffKey> {
        let mut values = Vec::with_capacity(self.key_columns.len());
        for column in &self.key_columns {
            let value = fields.get(column).ok_or_else(|| {
                CsvdiffError::schema_mismatch(format!("key column '{}' missing from diff row", column))
            })?;
            values.push(value.clone());
        }
        Ok(DiffKey(values))
    }

    /// Add an entry under its key. An identical entry for the same side is
    /// ignored, a different one is a duplicate key.
    pub fn insert(&mut self, entry: DiffEntry) -> Result<()> {
        let key = self.key_of(&entry.fields)?;
        let key_text = key.to_string();
        let slot = self.entries.entry(key).or_default();
        if let Some(existing) = slot.iter().find(|e| e.origin == entry.origin) {
            if existing.fields == entry.fields {
                return Ok(());
            }
            return Err(CsvdiffError::DuplicateKey {
                key: key_text,
                origin: entry.origin.to_string(),
            });
        }
        slot.push(entry);
        slot.sort_by_key(|e| e.origin == Origin::Right);
        Ok(())
    }

    pub fn get(&self, key: &DiffKey) -> Option<&[DiffEntry]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &DiffKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DiffKey, &[DiffEntry])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &DiffKey> {
        self.entries.keys()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (changed on both sides, only on the left, only on the right)
    pub fn shape(&self) -> (usize, usize, usize) {
        let mut shape = (0, 0, 0);
        for entries in self.entries.values() {
            match entries.as_slice() {
                [_, _] => shape.0 += 1,
                [only] if only.origin == Origin::Left => shape.1 += 1,
                _ => shape.2 += 1,
            }
        }
        shape
    }
}

/// Row diff of one pair of tables
#[derive(Debug, Clone, Serialize)]
pub struct TableDiff {
    pub database: Option<String>,
    pub left_table: String,
    pub right_table: String,
    pub index: DiffIndex,
}

/// Comparison mode selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    Memory,
    Database,
}

impl DiffMode {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "database" => Ok(Self::Database),
            _ => Err(format!("Invalid diff mode: {}. Use 'memory' or 'database'", s)),
        }
    }
}

/// Where the two sides come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    /// Two tables of one store handed in by the caller
    Memory { left_table: String, right_table: String },
    /// Paired database files, either two files or two folders of files
    Database {
        origin: PathBuf,
        compare: PathBuf,
        ignored: BTreeSet<String>,
    },
}

/// Validated parameters of one comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    source: DiffSource,
    key_columns: Vec<String>,
    excluded_columns: Vec<String>,
}

impl DiffConfig {
    pub fn memory(
        left_table: impl Into<String>,
        right_table: impl Into<String>,
        key_columns: Vec<String>,
    ) -> Result<Self> {
        let left_table = left_table.into();
        let right_table = right_table.into();
        if left_table.is_empty() || right_table.is_empty() {
            return Err(CsvdiffError::diff_config(
                "memory mode requires two table names",
            ));
        }
        Self::new(
            DiffSource::Memory {
                left_table,
                right_table,
            },
            key_columns,
        )
    }

    pub fn database(
        origin: impl Into<PathBuf>,
        compare: impl Into<PathBuf>,
        key_columns: Vec<String>,
    ) -> Result<Self> {
        let origin = origin.into();
        let compare = compare.into();
        if origin.as_os_str().is_empty() || compare.as_os_str().is_empty() {
            return Err(CsvdiffError::diff_config(
                "database mode requires origin and compare locations",
            ));
        }
        Self::new(
            DiffSource::Database {
                origin,
                compare,
                ignored: BTreeSet::new(),
            },
            key_columns,
        )
    }

    /// Build from loosely supplied parameters, failing when the chosen
    /// mode's required ones are absent.
    pub fn from_parts(
        mode: DiffMode,
        tables: Option<(String, String)>,
        paths: Option<(PathBuf, PathBuf)>,
        key_columns: Vec<String>,
    ) -> Result<Self> {
        match (mode, tables, paths) {
            (DiffMode::Memory, Some((left, right)), _) => Self::memory(left, right, key_columns),
            (DiffMode::Memory, None, _) => Err(CsvdiffError::diff_config(
                "memory mode requires two table names",
            )),
            (DiffMode::Database, _, Some((origin, compare))) => {
                Self::database(origin, compare, key_columns)
            }
            (DiffMode::Database, _, None) => Err(CsvdiffError::diff_config(
                "Please provide folders containing database files to compare",
            )),
        }
    }

    fn new(source: DiffSource, key_columns: Vec<String>) -> Result<Self> {
        if key_columns.is_empty() || key_columns.iter().any(String::is_empty) {
            return Err(CsvdiffError::diff_config(
                "at least one key column is required (e.g. the row_id identity column)",
            ));
        }
        Ok(Self {
            source,
            key_columns,
            excluded_columns: vec![FILE_NAME_COLUMN.to_string(), LINE_NO_COLUMN.to_string()],
        })
    }

    /// Database file names skipped in database mode
    pub fn with_ignored<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let DiffSource::Database { ignored, .. } = &mut self.source {
            ignored.extend(names.into_iter().map(Into::into));
        }
        self
    }

    /// Replace the columns left out of the row comparison
    pub fn with_excluded_columns(mut self, columns: Vec<String>) -> Result<Self> {
        if let Some(key) = self.key_columns.iter().find(|k| columns.contains(k)) {
            return Err(CsvdiffError::diff_config(format!(
                "key column '{}' cannot be excluded from comparison",
                key
            )));
        }
        self.excluded_columns = columns;
        Ok(self)
    }

    pub fn source(&self) -> &DiffSource {
        &self.source
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn excluded_columns(&self) -> &[String] {
        &self.excluded_columns
    }

    /// Columns left out of the row comparison: the configured exclusions
    /// and the identity column, minus any key column
    pub fn compared_exclusions(&self) -> Vec<String> {
        self.excluded_columns
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(IDENTITY_COLUMN))
            .filter(|c| !self.key_columns.iter().any(|k| k == c))
            .map(String::from)
            .collect()
    }

    /// Select the backend for this configuration. Memory mode needs the
    /// caller's store.
    pub fn backend<'a>(&'a self, store: Option<&'a Store>) -> Result<Box<dyn DiffBackend + 'a>> {
        match &self.source {
            DiffSource::Memory {
                left_table,
                right_table,
            } => {
                let store = store.ok_or_else(|| {
                    CsvdiffError::diff_config("memory mode requires an open store")
                })?;
                Ok(Box::new(MemoryBackend {
                    store,
                    left_table,
                    right_table,
                    config: self,
                }))
            }
            DiffSource::Database {
                origin,
                compare,
                ignored,
            } => Ok(Box::new(DatabaseBackend {
                origin,
                compare,
                ignored,
                config: self,
            })),
        }
    }

    pub fn run(&self, store: Option<&Store>) -> Result<Vec<TableDiff>> {
        let backend = self.backend(store)?;
        log::info!("Running {} diff", backend.name());
        backend.run()
    }
}

/// A way of sourcing the two sides of a diff
pub trait DiffBackend {
    fn name(&self) -> &'static str;

    fn run(&self) -> Result<Vec<TableDiff>>;
}

/// Two named tables in one store
pub struct MemoryBackend<'a> {
    store: &'a Store,
    left_table: &'a str,
    right_table: &'a str,
    config: &'a DiffConfig,
}

impl DiffBackend for MemoryBackend<'_> {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn run(&self) -> Result<Vec<TableDiff>> {
        let tables = self.store.table_names(None)?;
        let missing: Vec<&str> = [self.left_table, self.right_table]
            .into_iter()
            .filter(|t| !tables.iter().any(|name| name == t))
            .collect();
        if !missing.is_empty() {
            return Err(CsvdiffError::schema_mismatch(format!(
                "Invalid tables names for compare: {}",
                missing.join(", ")
            )));
        }

        let index = diff_tables(
            self.store,
            &TableRef::new(self.left_table),
            &TableRef::new(self.right_table),
            self.config,
        )?;

        Ok(vec![TableDiff {
            database: None,
            left_table: self.left_table.to_string(),
            right_table: self.right_table.to_string(),
            index,
        }])
    }
}

/// Paired database files compared table by table
pub struct DatabaseBackend<'a> {
    origin: &'a Path,
    compare: &'a Path,
    ignored: &'a BTreeSet<String>,
    config: &'a DiffConfig,
}

impl DatabaseBackend<'_> {
    /// (database name, origin file, compare file) for every database to diff
    fn database_pairs(&self) -> Result<Vec<(String, PathBuf, PathBuf)>> {
        if self.origin.is_file() && self.compare.is_file() {
            if !is_database_file(self.origin) || !is_database_file(self.compare) {
                return Err(CsvdiffError::diff_config(format!(
                    "'{}' and '{}' are not database files",
                    self.origin.display(),
                    self.compare.display()
                )));
            }
            return Ok(vec![(
                file_name(self.origin),
                self.origin.to_path_buf(),
                self.compare.to_path_buf(),
            )]);
        }

        if !self.origin.is_dir() || !self.compare.is_dir() {
            return Err(CsvdiffError::diff_config(
                "Please provide folders containing database files to compare",
            ));
        }

        let mut pairs = Vec::new();
        for entry in WalkDir::new(self.origin)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_database_file(path) {
                continue;
            }
            let name = file_name(path);
            pairs.push((name.clone(), path.to_path_buf(), self.compare.join(&name)));
        }
        Ok(pairs)
    }
}

impl DiffBackend for DatabaseBackend<'_> {
    fn name(&self) -> &'static str {
        "database"
    }

    fn run(&self) -> Result<Vec<TableDiff>> {
        let alias = DEFAULT_ATTACH_ALIAS;
        let mut diffs = Vec::new();

        for (name, origin_path, compare_path) in self.database_pairs()? {
            if self.ignored.contains(&name) {
                log::info!("{} ignored", name);
                continue;
            }
            if !compare_path.is_file() {
                return Err(CsvdiffError::schema_mismatch(format!(
                    "database '{}' has no counterpart at {}",
                    name,
                    compare_path.display()
                )));
            }
            log::info!("{} START", name);

            let store = Store::open(&origin_path)?;
            store.attach(&compare_path, alias)?;
            let compare_tables = store.table_names(Some(alias))?;

            for table in store.table_names(None)? {
                if !compare_tables.contains(&table) {
                    return Err(CsvdiffError::schema_mismatch(format!(
                        "table '{}' of database '{}' is missing from {}",
                        table,
                        name,
                        compare_path.display()
                    )));
                }
                let index = diff_tables(
                    &store,
                    &TableRef::new(table.as_str()),
                    &TableRef::in_database(alias, table.as_str()),
                    self.config,
                )?;
                if !index.is_empty() {
                    diffs.push(TableDiff {
                        database: Some(name.clone()),
                        left_table: table.clone(),
                        right_table: format!("{}.{}", alias, table),
                        index,
                    });
                }
            }
            log::info!("{} END", name);
        }

        Ok(diffs)
    }
}

/// Diff two tables of one store with the in-memory backend
pub fn diff(
    store: &Store,
    left_table: &str,
    right_table: &str,
    key_columns: &[String],
) -> Result<DiffIndex> {
    let config = DiffConfig::memory(left_table, right_table, key_columns.to_vec())?;
    let mut diffs = config.run(Some(store))?;
    diffs
        .pop()
        .map(|d| d.index)
        .ok_or_else(|| CsvdiffError::sql_diff("memory diff produced no result"))
}

/// Align, run both EXCEPT passes and index the result
fn diff_tables(
    store: &Store,
    left: &TableRef,
    right: &TableRef,
    config: &DiffConfig,
) -> Result<DiffIndex> {
    let excluded = config.compared_exclusions();
    let left_columns = compared_columns(store, left, &excluded)?;
    let right_columns = compared_columns(store, right, &excluded)?;

    let left_names: Vec<&str> = left_columns.iter().map(|c| c.name.as_str()).collect();
    let right_names: Vec<&str> = right_columns.iter().map(|c| c.name.as_str()).collect();
    let aligned = align(&left_names, &right_names);

    for key in &config.key_columns {
        if !left_names.contains(&key.as_str()) || !right_names.contains(&key.as_str()) {
            return Err(CsvdiffError::schema_mismatch(format!(
                "key column '{}' must exist in both {} and {}",
                key, left, right
            )));
        }
    }

    let left_types: HashMap<&str, &str> = left_columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str()))
        .collect();
    let right_types: HashMap<&str, &str> = right_columns
        .iter()
        .map(|c| (c.name.as_str(), c.data_type.as_str()))
        .collect();
    let (left_select, right_select) = select_lists(&aligned, &left_types, &right_types);

    let order_by = config
        .key_columns
        .iter()
        .map(|k| quote_ident(k))
        .collect::<Vec<_>>()
        .join(", ");
    let columns: Vec<String> = aligned.column_names().into_iter().map(String::from).collect();
    let mut index = DiffIndex::new(config.key_columns.clone(), columns.clone());

    let passes = [
        (Origin::Left, &left_select, left, &right_select, right),
        (Origin::Right, &right_select, right, &left_select, left),
    ];
    for (origin, from_select, from, minus_select, minus) in passes {
        let sql = format!(
            "SELECT {} FROM {} EXCEPT SELECT {} FROM {} ORDER BY {}",
            from_select,
            from.qualified(),
            minus_select,
            minus.qualified(),
            order_by
        );
        let rows = store.query_rows(&sql, columns.len())?;
        log::debug!("{} pass produced {} rows", origin, rows.len());
        for cells in rows {
            let fields: IndexMap<String, CellValue> = columns.iter().cloned().zip(cells).collect();
            index.insert(DiffEntry { origin, fields })?;
        }
    }

    let (changed, left_only, right_only) = index.shape();
    log::info!(
        "{} vs {}: {} changed, {} only left, {} only right",
        left,
        right,
        changed,
        left_only,
        right_only
    );
    Ok(index)
}

fn compared_columns(store: &Store, table: &TableRef, excluded: &[String]) -> Result<Vec<StoreColumn>> {
    let columns = store.columns(table)?;
    if columns.is_empty() {
        return Err(CsvdiffError::schema_mismatch(format!("table {} not found", table)));
    }
    Ok(columns
        .into_iter()
        .filter(|c| !excluded.contains(&c.name))
        .collect())
}

/// Render both projection lists as SQL. Common columns whose declared types
/// differ are compared as text.
fn select_lists(
    aligned: &AlignedSchema,
    left_types: &HashMap<&str, &str>,
    right_types: &HashMap<&str, &str>,
) -> (String, String) {
    let mut left = Vec::with_capacity(aligned.len());
    let mut right = Vec::with_capacity(aligned.len());
    for (l, r) in aligned.pairs() {
        let name = l.name();
        let as_text = match (left_types.get(name), right_types.get(name)) {
            (Some(lt), Some(rt)) => lt != rt,
            _ => false,
        };
        left.push(render_projection(l, as_text));
        right.push(render_projection(r, as_text));
    }
    (left.join(", "), right.join(", "))
}

fn render_projection(projection: &Projection, as_text: bool) -> String {
    let quoted = quote_ident(projection.name());
    match projection {
        Projection::Null(_) => format!("NULL AS {}", quoted),
        Projection::Column(_) if as_text => format!("CAST({} AS VARCHAR) AS {}", quoted, quoted),
        Projection::Column(_) => quoted,
    }
}

fn is_database_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DATABASE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
