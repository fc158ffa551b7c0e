//! Hash index for TinyRDB
//!
//! Maps one column's values to the set of row handles currently holding
//! that value. Supports exact-match lookup only.

use std::collections::{BTreeSet, HashMap};

use super::row::{Row, RowId};
use super::value::Value;

/// Single-column hash index
#[derive(Debug, Clone)]
pub struct HashIndex {
    /// Index name
    name: String,
    /// Indexed column
    column: String,
    /// Whether the column carries PRIMARY KEY or UNIQUE
    unique: bool,
    /// value -> row handles, kept ordered so lookups return insertion order
    entries: HashMap<Value, BTreeSet<RowId>>,
}

impl HashIndex {
    /// Create an empty index
    pub fn new(name: impl Into<String>, column: impl Into<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            unique,
            entries: HashMap::new(),
        }
    }

    /// Build an index by scanning existing rows once
    pub fn build<'a>(
        name: impl Into<String>,
        column: impl Into<String>,
        unique: bool,
        rows: impl IntoIterator<Item = (RowId, &'a Row)>,
    ) -> Self {
        let mut index = Self::new(name, column, unique);
        for (row_id, row) in rows {
            let value = row.get(&index.column).cloned().unwrap_or(Value::Null);
            index.on_insert(row_id, &value);
        }
        index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Record a newly inserted row
    pub fn on_insert(&mut self, row_id: RowId, value: &Value) {
        self.entries.entry(value.clone()).or_default().insert(row_id);
    }

    /// Move a row from its old bucket to its new one
    pub fn on_update(&mut self, row_id: RowId, old: &Value, new: &Value) {
        if old == new {
            return;
        }
        self.on_delete(row_id, old);
        self.on_insert(row_id, new);
    }

    /// Forget a deleted row
    pub fn on_delete(&mut self, row_id: RowId, value: &Value) {
        if let Some(ids) = self.entries.get_mut(value) {
            ids.remove(&row_id);
            if ids.is_empty() {
                self.entries.remove(value);
            }
        }
    }

    /// Row handles whose current value equals `value`, in insertion order
    pub fn lookup(&self, value: &Value) -> Vec<RowId> {
        self.entries
            .get(value)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether storing `value` in some row other than `exclude` would break
    /// uniqueness. NULLs never conflict.
    pub fn conflicts(&self, value: &Value, exclude: Option<RowId>) -> bool {
        if value.is_null() {
            return false;
        }
        self.entries
            .get(value)
            .map(|ids| ids.iter().any(|id| Some(*id) != exclude))
            .unwrap_or(false)
    }

    /// Total number of indexed row handles
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
