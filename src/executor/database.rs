//! Database for TinyRDB
//!
//! The database owns the table-name mapping and is the single entry point
//! for statements. After any statement that changed a table it hands the
//! table's full state to the configured [`SnapshotStore`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use super::join::{join_projection, nested_loop_join, JoinScope};
use super::result::QueryResult;
use crate::catalog::Column;
use crate::config::{DatabaseConfig, DEFAULT_NAME};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::sql::parse;
use crate::storage::{InsertValues, JsonStore, SnapshotStore, Table, TableSnapshot};

/// Table metadata for introspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<Column>,
    /// (index name, column) pairs
    pub indexes: Vec<(String, String)>,
    pub row_count: usize,
}

impl fmt::Display for TableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Table: {}", self.name)?;
        writeln!(f, "Columns:")?;
        for col in &self.columns {
            let constraints = col.constraint_names();
            if constraints.is_empty() {
                writeln!(f, "  {} {}", col.name, col.data_type)?;
            } else {
                writeln!(f, "  {} {} {}", col.name, col.data_type, constraints.join(" "))?;
            }
        }
        if !self.indexes.is_empty() {
            writeln!(f, "Indexes:")?;
            for (name, column) in &self.indexes {
                writeln!(f, "  {} ({})", name, column)?;
            }
        }
        write!(f, "Rows: {}", self.row_count)
    }
}

/// A set of named tables
pub struct Database {
    name: String,
    tables: BTreeMap<String, Table>,
    store: Option<Box<dyn SnapshotStore>>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Create an empty in-memory database
    pub fn new() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            tables: BTreeMap::new(),
            store: None,
        }
    }

    /// Open a database as configured, loading any stored tables
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        let mut db = match config.data_path() {
            Some(dir) => {
                let store = JsonStore::open(dir)?.pretty(config.pretty);
                Self::with_store(Box::new(store))?
            }
            None => Self::new(),
        };
        db.name = config.name.clone();
        info!(
            name = %db.name,
            tables = db.tables.len(),
            persistent = config.is_persistent(),
            "database opened"
        );
        Ok(db)
    }

    /// Create a database backed by `store`, loading everything it holds
    pub fn with_store(store: Box<dyn SnapshotStore>) -> Result<Self> {
        let snapshots = store.load_all()?;
        let mut db = Self::new();
        db.restore(snapshots)?;
        db.store = Some(store);
        Ok(db)
    }

    /// Populate the table mapping from snapshots.
    ///
    /// Every row goes through the normal insert checks, so a snapshot that
    /// breaks a constraint fails with the matching error.
    pub fn restore(&mut self, snapshots: Vec<TableSnapshot>) -> Result<()> {
        for snapshot in snapshots {
            if self.tables.contains_key(&snapshot.name) {
                return Err(Error::TableAlreadyExists(snapshot.name));
            }
            let table = snapshot.restore()?;
            info!(table = table.name(), rows = table.len(), "restored table");
            self.tables.insert(table.name().to_string(), table);
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parse and execute one statement
    pub fn execute_sql(&mut self, sql: &str) -> Result<QueryResult> {
        let stmt = parse(sql)?;
        self.execute(stmt)
    }

    /// Execute a parsed statement
    pub fn execute(&mut self, stmt: Statement) -> Result<QueryResult> {
        match stmt {
            Statement::CreateTable(ct) => self.execute_create_table(ct),
            Statement::DropTable(dt) => self.execute_drop_table(&dt.table_name),
            Statement::CreateIndex(ci) => self.execute_create_index(ci),
            Statement::Insert(ins) => self.execute_insert(ins),
            Statement::Select(sel) => self.execute_select(sel),
            Statement::Update(upd) => self.execute_update(upd),
            Statement::Delete(del) => self.execute_delete(del),
        }
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Table names in sorted order
    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Columns, indexes and row count of a table
    pub fn describe(&self, name: &str) -> Result<TableInfo> {
        let table = self.get_table(name)?;
        Ok(TableInfo {
            name: table.name().to_string(),
            columns: table.schema().columns().to_vec(),
            indexes: table
                .indexes()
                .map(|idx| (idx.name().to_string(), idx.column().to_string()))
                .collect(),
            row_count: table.len(),
        })
    }

    /// Full current state of a table, as handed to the store
    pub fn snapshot(&self, name: &str) -> Result<TableSnapshot> {
        self.get_table(name).map(TableSnapshot::capture)
    }

    fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    // ========== DDL ==========

    fn execute_create_table(&mut self, stmt: CreateTableStatement) -> Result<QueryResult> {
        if self.tables.contains_key(&stmt.table_name) {
            return Err(Error::TableAlreadyExists(stmt.table_name));
        }

        let table = Table::create(stmt.table_name.clone(), stmt.columns)?;
        let columns = table.schema().column_count();
        self.tables.insert(stmt.table_name.clone(), table);
        if let Err(e) = self.persist(&stmt.table_name) {
            self.tables.remove(&stmt.table_name);
            return Err(e);
        }
        info!(table = %stmt.table_name, columns, "created table");

        Ok(QueryResult::with_message(format!(
            "Table '{}' created",
            stmt.table_name
        )))
    }

    fn execute_drop_table(&mut self, table_name: &str) -> Result<QueryResult> {
        self.get_table(table_name)?;

        // Forget the stored copy first so a failed removal keeps the table
        if let Some(store) = &self.store {
            store.remove(table_name)?;
        }
        if let Some(table) = self.tables.remove(table_name) {
            info!(table = table_name, rows = table.len(), "dropped table");
        }

        Ok(QueryResult::with_message(format!(
            "Table '{}' dropped",
            table_name
        )))
    }

    fn execute_create_index(&mut self, stmt: CreateIndexStatement) -> Result<QueryResult> {
        let CreateIndexStatement {
            index_name,
            table_name,
            column,
        } = stmt;

        self.mutate(&table_name, |table| {
            table.create_index(index_name.clone(), &column)?;
            Ok(QueryResult::with_message(format!(
                "Index '{}' created on '{}'",
                index_name, table_name
            )))
        })
    }

    // ========== DML ==========

    fn execute_insert(&mut self, stmt: InsertStatement) -> Result<QueryResult> {
        let values = match stmt.columns {
            Some(columns) => {
                if columns.len() != stmt.values.len() {
                    return Err(Error::ColumnCountMismatch {
                        expected: columns.len(),
                        found: stmt.values.len(),
                    });
                }
                InsertValues::Named(columns.into_iter().zip(stmt.values).collect())
            }
            None => InsertValues::Positional(stmt.values),
        };

        self.mutate(&stmt.table_name, |table| {
            let row = table.insert(values)?;
            let columns = row.columns().map(str::to_string).collect();
            Ok(QueryResult {
                columns,
                rows: vec![row],
                affected_rows: 1,
                message: Some("1 row inserted".to_string()),
            })
        })
    }

    fn execute_update(&mut self, stmt: UpdateStatement) -> Result<QueryResult> {
        self.mutate(&stmt.table_name, |table| {
            let count = table.update(stmt.where_clause.as_ref(), &stmt.assignments)?;
            Ok(QueryResult::with_affected_rows(
                count,
                format!("{} row(s) updated", count),
            ))
        })
    }

    fn execute_delete(&mut self, stmt: DeleteStatement) -> Result<QueryResult> {
        self.mutate(&stmt.table_name, |table| {
            let count = table.delete(stmt.where_clause.as_ref())?;
            Ok(QueryResult::with_affected_rows(
                count,
                format!("{} row(s) deleted", count),
            ))
        })
    }

    fn execute_select(&self, stmt: SelectStatement) -> Result<QueryResult> {
        let table = self.get_table(&stmt.from)?;

        if let Some(join) = &stmt.join {
            let other = self.get_table(&join.table)?;
            return Self::execute_join(table, other, join, &stmt);
        }

        let (columns, pairs) = match &stmt.projection {
            Projection::All => (
                table
                    .schema()
                    .column_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                None,
            ),
            Projection::Columns(refs) => {
                let pairs = refs
                    .iter()
                    .map(|r| -> Result<(String, String)> {
                        Ok((table.resolve(r)?.name.clone(), r.to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let labels = pairs.iter().map(|(_, label)| label.clone()).collect();
                (labels, Some(pairs))
            }
        };

        let rows = table.select(stmt.where_clause.as_ref())?;
        let rows = match pairs {
            Some(pairs) => rows.iter().map(|row| row.project(&pairs)).collect(),
            None => rows,
        };

        debug!(table = %stmt.from, rows = rows.len(), "select");
        Ok(QueryResult::with_rows(columns, rows))
    }

    fn execute_join(
        left: &Table,
        right: &Table,
        join: &JoinClause,
        stmt: &SelectStatement,
    ) -> Result<QueryResult> {
        let scope = JoinScope::new(left, right);
        let (columns, pairs) = join_projection(&scope, &stmt.projection)?;

        let rows = nested_loop_join(left, right, join, stmt.where_clause.as_ref())?;
        let rows = match pairs {
            Some(pairs) => rows.iter().map(|row| row.project(&pairs)).collect(),
            None => rows,
        };

        Ok(QueryResult::with_rows(columns, rows))
    }

    // ========== Persistence ==========

    /// Run `op` against a table, persisting it if its state changed.
    ///
    /// A statement that fails part way (an UPDATE stopped by a UNIQUE
    /// violation) is still persisted, so the store never lags memory.
    fn mutate<F>(&mut self, table_name: &str, op: F) -> Result<QueryResult>
    where
        F: FnOnce(&mut Table) -> Result<QueryResult>,
    {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| Error::TableNotFound(table_name.to_string()))?;

        let before = table.version();
        let outcome = op(table);
        let changed = table.version() != before;

        if changed {
            if let Err(e) = self.persist(table_name) {
                if outcome.is_ok() {
                    return Err(e);
                }
                warn!(table = table_name, error = %e, "failed to persist table");
            }
        }
        outcome
    }

    fn persist(&self, table_name: &str) -> Result<()> {
        let (Some(store), Some(table)) = (&self.store, self.tables.get(table_name)) else {
            return Ok(());
        };
        store.save(&TableSnapshot::capture(table))
    }
}
