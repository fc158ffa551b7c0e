//! Table storage for TinyRDB
//!
//! A table owns its schema, an arena of rows addressed by stable handles,
//! and one hash index per indexed column. Every mutation validates first,
//! then updates rows and indexes together, so lookups always agree with
//! the stored data.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::index::HashIndex;
use super::row::{Row, RowId};
use super::value::Value;
use crate::catalog::{Column, Schema};
use crate::error::{Error, Result};
use crate::sql::ast::{Assignment, ColumnRef, CompareOp, Condition};

/// Values supplied to an INSERT
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValues {
    /// One value per schema column, in schema order
    Positional(Vec<Value>),
    /// A subset of columns by name; the rest become NULL
    Named(Vec<(String, Value)>),
}

/// A table combining schema, rows and indexes
#[derive(Debug)]
pub struct Table {
    /// Table name
    name: String,
    /// Table schema
    schema: Schema,
    /// Row arena in insertion order
    rows: IndexMap<RowId, Row>,
    /// Indexes by column name
    indexes: BTreeMap<String, HashIndex>,
    /// Next row handle to hand out
    next_row_id: u64,
    /// Bumped on every committed row or index change
    version: u64,
}

impl Table {
    /// Create a new empty table, indexing the primary key if there is one
    pub fn create(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        let schema = Schema::new(&name, columns)?;

        let mut table = Self {
            name,
            schema,
            rows: IndexMap::new(),
            indexes: BTreeMap::new(),
            next_row_id: 1,
            version: 0,
        };

        if let Some(pk) = table.schema.primary_key() {
            let column = pk.name.clone();
            let index_name = format!("pk_{}", table.name);
            table.create_index(index_name, &column)?;
        }

        Ok(table)
    }

    /// Get table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Monotonic change counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rows in storage order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Rows with their handles, in storage order
    pub fn entries(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Index on `column`, if any
    pub fn index(&self, column: &str) -> Option<&HashIndex> {
        self.indexes.get(column)
    }

    /// All indexes, ordered by column name
    pub fn indexes(&self) -> impl Iterator<Item = &HashIndex> {
        self.indexes.values()
    }

    /// Build a hash index over an existing column
    pub fn create_index(&mut self, name: impl Into<String>, column: &str) -> Result<()> {
        let col = self.column(column)?;
        let unique = col.is_unique();

        if self.indexes.contains_key(column) {
            return Err(Error::IndexAlreadyExists(column.to_string()));
        }

        let index = HashIndex::build(name, column, unique, self.entries());
        debug!(
            table = %self.name,
            column,
            rows = index.len(),
            "built hash index"
        );
        self.indexes.insert(column.to_string(), index);
        self.version += 1;
        Ok(())
    }

    /// Insert one row, returning it as stored
    pub fn insert(&mut self, values: InsertValues) -> Result<Row> {
        let supplied = self.arrange(values)?;

        let mut converted = Vec::with_capacity(supplied.len());
        for (col, value) in self.schema.columns().iter().zip(supplied) {
            converted.push(Self::convert(col, value)?);
        }

        for (col, value) in self.schema.columns().iter().zip(&converted) {
            Self::check_not_null(col, value)?;
        }

        for (col, value) in self.schema.columns().iter().zip(&converted) {
            if col.is_unique() {
                self.check_unique(col, value, None)?;
            }
        }

        let row: Row = self
            .schema
            .columns()
            .iter()
            .map(|c| c.name.clone())
            .zip(converted)
            .collect();

        let row_id = RowId(self.next_row_id);
        self.next_row_id += 1;

        for index in self.indexes.values_mut() {
            let value = row.get(index.column()).unwrap_or(&Value::Null);
            index.on_insert(row_id, value);
        }
        self.rows.insert(row_id, row.clone());
        self.version += 1;

        debug!(table = %self.name, row_id = row_id.as_u64(), "inserted row");
        Ok(row)
    }

    /// Rows matching `predicate` (all rows when None), in storage order
    pub fn select(&self, predicate: Option<&Condition>) -> Result<Vec<Row>> {
        let ids = self.matching_ids(predicate)?;
        Ok(ids
            .into_iter()
            .filter_map(|id| self.rows.get(&id).cloned())
            .collect())
    }

    /// Apply `assignments` to every row matching `predicate`.
    ///
    /// Each row is updated all-or-nothing. There is no statement-level
    /// rollback: if a later row fails its UNIQUE check, rows already
    /// updated stay updated and the error is returned.
    pub fn update(
        &mut self,
        predicate: Option<&Condition>,
        assignments: &[Assignment],
    ) -> Result<usize> {
        let mut resolved: Vec<(Column, Value)> = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let col = self.column(&assignment.column)?;
            if resolved.iter().any(|(c, _)| c.name == col.name) {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
            let value = Self::convert(col, assignment.value.clone())?;
            Self::check_not_null(col, &value)?;
            resolved.push((col.clone(), value));
        }

        let ids = self.matching_ids(predicate)?;
        let mut updated = 0;

        for row_id in ids {
            for (col, value) in &resolved {
                if col.is_unique() {
                    if let Err(e) = self.check_unique(col, value, Some(row_id)) {
                        if updated > 0 {
                            warn!(
                                table = %self.name,
                                updated,
                                "update stopped part way; earlier rows stay committed"
                            );
                        }
                        return Err(e);
                    }
                }
            }

            let Some(old) = self.rows.get(&row_id) else {
                continue;
            };
            let mut new = old.clone();
            for (col, value) in &resolved {
                new.set(col.name.clone(), value.clone());
            }

            for index in self.indexes.values_mut() {
                let column = index.column().to_string();
                let before = old.get(&column).unwrap_or(&Value::Null);
                let after = new.get(&column).unwrap_or(&Value::Null);
                index.on_update(row_id, before, after);
            }
            self.rows.insert(row_id, new);
            self.version += 1;
            updated += 1;
        }

        debug!(table = %self.name, updated, "updated rows");
        Ok(updated)
    }

    /// Remove every row matching `predicate`, returning how many went
    pub fn delete(&mut self, predicate: Option<&Condition>) -> Result<usize> {
        let ids = self.matching_ids(predicate)?;
        let mut deleted = 0;

        for row_id in ids {
            if let Some(row) = self.rows.shift_remove(&row_id) {
                for index in self.indexes.values_mut() {
                    let value = row.get(index.column()).unwrap_or(&Value::Null);
                    index.on_delete(row_id, value);
                }
                deleted += 1;
            }
        }

        if deleted > 0 {
            self.version += 1;
        }
        debug!(table = %self.name, deleted, "deleted rows");
        Ok(deleted)
    }

    /// Look up a column, qualified names must name this table
    pub fn resolve(&self, column: &ColumnRef) -> Result<&Column> {
        match &column.table {
            Some(table) if table != &self.name => {
                Err(Error::column_not_found(column.to_string(), &self.name))
            }
            _ => self.column(&column.column),
        }
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.schema
            .get_column(name)
            .ok_or_else(|| Error::column_not_found(name, &self.name))
    }

    /// Handles of rows matching `predicate`, in storage order.
    ///
    /// An equality on an indexed column is answered by the index; every
    /// other predicate scans.
    fn matching_ids(&self, predicate: Option<&Condition>) -> Result<Vec<RowId>> {
        let Some(cond) = predicate else {
            return Ok(self.rows.keys().copied().collect());
        };

        let col = self.resolve(&cond.column)?;

        if cond.op == CompareOp::Eq {
            if let Some(index) = self.indexes.get(&col.name) {
                if let Some(key) = col.data_type.convert(cond.value.clone()) {
                    return Ok(index.lookup(&key));
                }
            }
        }

        Ok(self
            .rows
            .iter()
            .filter(|(_, row)| cond.matches(row.get(&col.name).unwrap_or(&Value::Null)))
            .map(|(id, _)| *id)
            .collect())
    }

    /// Line the supplied values up with the schema, filling NULLs
    fn arrange(&self, values: InsertValues) -> Result<Vec<Value>> {
        match values {
            InsertValues::Positional(values) => {
                if values.len() != self.schema.column_count() {
                    return Err(Error::ColumnCountMismatch {
                        expected: self.schema.column_count(),
                        found: values.len(),
                    });
                }
                Ok(values)
            }
            InsertValues::Named(pairs) => {
                let mut slots: Vec<Option<Value>> = vec![None; self.schema.column_count()];
                for (name, value) in pairs {
                    let position = self
                        .schema
                        .get_column_index(&name)
                        .ok_or_else(|| Error::column_not_found(&name, &self.name))?;
                    if slots[position].is_some() {
                        return Err(Error::DuplicateColumn(name));
                    }
                    slots[position] = Some(value);
                }
                Ok(slots
                    .into_iter()
                    .map(|v| v.unwrap_or(Value::Null))
                    .collect())
            }
        }
    }

    fn convert(col: &Column, value: Value) -> Result<Value> {
        let found = value.type_name();
        col.data_type
            .convert(value)
            .ok_or_else(|| Error::TypeMismatch {
                column: col.name.clone(),
                expected: col.data_type.to_string(),
                found: found.to_string(),
            })
    }

    fn check_not_null(col: &Column, value: &Value) -> Result<()> {
        if col.rejects_null() && value.is_null() {
            return Err(Error::NullConstraintViolation(col.name.clone()));
        }
        Ok(())
    }

    /// Fail if another row already holds `value` in unique column `col`
    fn check_unique(&self, col: &Column, value: &Value, exclude: Option<RowId>) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }

        let taken = match self.indexes.get(&col.name) {
            Some(index) => index.conflicts(value, exclude),
            None => self.rows.iter().any(|(id, row)| {
                Some(*id) != exclude && row.get(&col.name).is_some_and(|v| v == value)
            }),
        };

        if taken {
            return Err(Error::UniqueConstraintViolation {
                column: col.name.clone(),
                value: value.to_sql_literal(),
            });
        }
        Ok(())
    }
}
