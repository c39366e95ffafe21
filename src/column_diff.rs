//! Field level breakdown of a [`DiffIndex`]

use crate::diff::{DiffEntry, DiffIndex, DiffKey, Origin};
use crate::value::CellValue;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Fields of one key that differ, seen from each side. Sorted by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldChanges {
    pub left: BTreeMap<String, CellValue>,
    pub right: BTreeMap<String, CellValue>,
}

impl FieldChanges {
    /// True when `column` is exclusive to either side
    pub fn is_changed(&self, column: &str) -> bool {
        self.left.contains_key(column) || self.right.contains_key(column)
    }
}

/// Per key field changes, in [`DiffIndex`] key order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnDiff {
    entries: IndexMap<DiffKey, FieldChanges>,
}

impl ColumnDiff {
    pub fn get(&self, key: &DiffKey) -> Option<&FieldChanges> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DiffKey, &FieldChanges)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pair every key's entries and collect the fields exclusive to each side.
///
/// A key with a single entry is paired with a placeholder that keeps the key
/// values and is null everywhere else; the placeholder side reports no
/// fields. Key columns are never reported.
pub fn extract_column_diffs(index: &DiffIndex) -> ColumnDiff {
    let key_columns = index.key_columns();
    let mut column_diff = ColumnDiff::default();

    for (key, entries) in index.iter() {
        let changes = match entries {
            [first, second, ..] => FieldChanges {
                left: exclusive_fields(&first.fields, &second.fields, key_columns),
                right: exclusive_fields(&second.fields, &first.fields, key_columns),
            },
            [only] => {
                let placeholder = placeholder_for(only, key_columns);
                let exclusive = exclusive_fields(&only.fields, &placeholder, key_columns);
                match only.origin {
                    Origin::Left => FieldChanges {
                        left: exclusive,
                        right: BTreeMap::new(),
                    },
                    Origin::Right => FieldChanges {
                        left: BTreeMap::new(),
                        right: exclusive,
                    },
                }
            }
            [] => continue,
        };
        column_diff.entries.insert(key.clone(), changes);
    }

    column_diff
}

/// Same column set as `entry`, key values kept, everything else null
fn placeholder_for(entry: &DiffEntry, key_columns: &[String]) -> IndexMap<String, CellValue> {
    entry
        .fields
        .iter()
        .map(|(name, value)| {
            let value = if key_columns.contains(name) {
                value.clone()
            } else {
                CellValue::Null
            };
            (name.clone(), value)
        })
        .collect()
}

fn exclusive_fields(
    row: &IndexMap<String, CellValue>,
    other: &IndexMap<String, CellValue>,
    key_columns: &[String],
) -> BTreeMap<String, CellValue> {
    row.iter()
        .filter(|(name, _)| !key_columns.contains(*name))
        .filter(|(name, value)| other.get(*name) != Some(*value))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
