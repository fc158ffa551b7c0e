//! Rows for TinyRDB
//!
//! A row maps column names to values, kept in schema order. Join results
//! reuse the same type with table-prefixed column names.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// Stable internal handle for a stored row.
///
/// Handles are allocated monotonically per table and never reused, so a
/// deleted row's handle cannot alias a live row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub(crate) u64);

impl RowId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A row (column name -> value)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: IndexMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set a column's value, keeping its position if already present
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.values.insert(column.into(), value);
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Copy this row's columns into `target` under `prefix.column`
    pub fn extend_prefixed(&self, prefix: &str, target: &mut Row) {
        for (column, value) in &self.values {
            target.set(format!("{}.{}", prefix, column), value.clone());
        }
    }

    /// Keep only the named columns, in the given order
    pub fn project(&self, columns: &[(String, String)]) -> Row {
        let mut out = Row::new();
        for (source, label) in columns {
            if let Some(value) = self.values.get(source) {
                out.set(label.clone(), value.clone());
            }
        }
        out
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_operations() {
        let mut row: Row = vec![("id", Value::Integer(1)), ("name", Value::from("Alice"))]
            .into_iter()
            .collect();

        assert_eq!(row.columns().count(), 2);
        assert_eq!(row.get("name"), Some(&Value::from("Alice")));

        row.set("id", Value::Integer(5));
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(row.get("id"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_prefix_and_project() {
        let row: Row = vec![("id", Value::Integer(1)), ("name", Value::from("Alice"))]
            .into_iter()
            .collect();
        let mut combined = Row::new();
        row.extend_prefixed("users", &mut combined);
        assert_eq!(
            combined.columns().collect::<Vec<_>>(),
            vec!["users.id", "users.name"]
        );

        let projected = combined.project(&[("users.name".to_string(), "name".to_string())]);
        assert_eq!(projected.columns().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_row_serializes_as_object() {
        let row: Row = vec![("id", Value::Integer(1)), ("ok", Value::Boolean(true))]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"id":1,"ok":true}"#);
    }
}
