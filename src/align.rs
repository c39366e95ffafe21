//! Schema alignment of two column sets
//!
//! Produces two positionally matched projection lists over the union of both
//! column sets. A column missing on one side is projected there as a null
//! placeholder carrying the missing column's name, so a set difference over
//! the two projections never fails on column count and every missing column
//! shows up as null.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One entry of a projection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "column", rename_all = "lowercase")]
pub enum Projection {
    /// The column is selected directly
    Column(String),
    /// The side lacks this column; selected as `NULL AS <name>`
    Null(String),
}

impl Projection {
    pub fn name(&self) -> &str {
        match self {
            Projection::Column(name) | Projection::Null(name) => name,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Projection::Null(_))
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::Column(name) => write!(f, "{}", name),
            Projection::Null(name) => write!(f, "null as {}", name),
        }
    }
}

/// Equal-length projection lists for the left and right side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignedSchema {
    pub left: Vec<Projection>,
    pub right: Vec<Projection>,
}

impl AlignedSchema {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Shared column order of both projections
    pub fn column_names(&self) -> Vec<&str> {
        self.left.iter().map(Projection::name).collect()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.left.iter().any(|p| p.name() == column)
    }

    /// Iterate positionally matched pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&Projection, &Projection)> {
        self.left.iter().zip(self.right.iter())
    }

    pub fn has_placeholders(&self) -> bool {
        self.pairs().any(|(l, r)| l.is_placeholder() || r.is_placeholder())
    }
}

/// Align two column lists.
///
/// Order: every column of `left` in its original order (common or left-only),
/// followed by right-only columns in `right`'s original order.
pub fn align<L: AsRef<str>, R: AsRef<str>>(left: &[L], right: &[R]) -> AlignedSchema {
    let left_set: HashSet<&str> = left.iter().map(AsRef::as_ref).collect();
    let right_set: HashSet<&str> = right.iter().map(AsRef::as_ref).collect();

    let capacity = left_set.union(&right_set).count();
    let mut aligned = AlignedSchema {
        left: Vec::with_capacity(capacity),
        right: Vec::with_capacity(capacity),
    };

    for name in left.iter().map(AsRef::as_ref) {
        aligned.left.push(Projection::Column(name.to_string()));
        if right_set.contains(name) {
            aligned.right.push(Projection::Column(name.to_string()));
        } else {
            aligned.right.push(Projection::Null(name.to_string()));
        }
    }

    for name in right.iter().map(AsRef::as_ref) {
        if !left_set.contains(name) {
            aligned.left.push(Projection::Null(name.to_string()));
            aligned.right.push(Projection::Column(name.to_string()));
        }
    }

    log::debug!("Aligned {} columns: {:?}", aligned.len(), aligned.column_names());
    aligned
}
