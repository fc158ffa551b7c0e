//! Schema definitions for TinyRDB
//!
//! This module defines table schemas and column metadata.

use super::types::DataType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Is this the primary key?
    #[serde(default)]
    pub primary_key: bool,
    /// Is this column unique?
    #[serde(default)]
    pub unique: bool,
    /// Is NULL rejected?
    #[serde(default)]
    pub not_null: bool,
}

impl Column {
    /// Create a new nullable column without constraints
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Set primary key flag
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        self
    }

    /// Set unique flag
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set NOT NULL flag
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    /// A primary key is implicitly NOT NULL
    pub fn rejects_null(&self) -> bool {
        self.not_null || self.primary_key
    }

    /// A primary key is implicitly UNIQUE
    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// Constraint keywords, in declaration order, for display
    pub fn constraint_names(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.primary_key {
            flags.push("PRIMARY KEY");
        }
        if self.unique {
            flags.push("UNIQUE");
        }
        if self.not_null {
            flags.push("NOT NULL");
        }
        flags
    }
}

/// Table schema - the fixed, ordered column list of one table
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,
    /// Column name to index mapping
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Validate and build a schema for `table` from an ordered column list
    pub fn new(table: &str, columns: Vec<Column>) -> Result<Self> {
        let mut name_to_index = HashMap::with_capacity(columns.len());
        for (position, col) in columns.iter().enumerate() {
            if name_to_index.insert(col.name.clone(), position).is_some() {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
        }

        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(Error::MultiplePrimaryKeys(table.to_string()));
        }

        Ok(Self {
            columns,
            name_to_index,
        })
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.name_to_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get the primary key column, if any
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let schema = Schema::new(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Text).not_null(true),
                Column::new("email", DataType::Text).unique(true),
            ],
        )
        .unwrap();

        assert_eq!(schema.column_count(), 3);
        assert!(schema.has_column("id"));
        assert!(!schema.has_column("unknown"));
        assert_eq!(schema.get_column_index("email"), Some(2));

        let id_col = schema.get_column("id").unwrap();
        assert!(id_col.rejects_null());
        assert!(id_col.is_unique());
        assert_eq!(schema.primary_key().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_duplicate_column() {
        let result = Schema::new(
            "t",
            vec![
                Column::new("a", DataType::Integer),
                Column::new("a", DataType::Text),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateColumn(name)) if name == "a"));
    }

    #[test]
    fn test_multiple_primary_keys() {
        let result = Schema::new(
            "t",
            vec![
                Column::new("a", DataType::Integer).primary_key(true),
                Column::new("b", DataType::Integer).primary_key(true),
            ],
        );
        assert!(matches!(result, Err(Error::MultiplePrimaryKeys(t)) if t == "t"));
    }
}
