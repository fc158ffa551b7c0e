//! Persistence boundary for TinyRDB
//!
//! The engine hands whole-table snapshots to a [`SnapshotStore`] after each
//! committed mutation and reads them all back at startup. [`JsonStore`]
//! keeps one JSON document per table in a data directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::row::Row;
use super::table::{InsertValues, Table};
use crate::catalog::Column;
use crate::error::Result;

/// Secondary index recorded in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub column: String,
}

/// Full state of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Table name
    pub name: String,
    /// Columns in schema order
    pub columns: Vec<Column>,
    /// Indexes beyond the automatic primary key index
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
    /// Rows in storage order
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl TableSnapshot {
    /// Capture a table's current schema, indexes and rows
    pub fn capture(table: &Table) -> Self {
        let pk = table.schema().primary_key().map(|c| c.name.as_str());
        Self {
            name: table.name().to_string(),
            columns: table.schema().columns().to_vec(),
            indexes: table
                .indexes()
                .filter(|idx| Some(idx.column()) != pk)
                .map(|idx| IndexSpec {
                    name: idx.name().to_string(),
                    column: idx.column().to_string(),
                })
                .collect(),
            rows: table.rows().cloned().collect(),
        }
    }

    /// Rebuild a table, running every row through the normal insert checks
    pub fn restore(self) -> Result<Table> {
        let mut table = Table::create(self.name, self.columns)?;
        for spec in self.indexes {
            table.create_index(spec.name, &spec.column)?;
        }
        for row in self.rows {
            table.insert(InsertValues::Named(row.into_iter().collect()))?;
        }
        Ok(table)
    }
}

/// Durable storage for table snapshots
pub trait SnapshotStore: Send {
    /// Read every stored table
    fn load_all(&self) -> Result<Vec<TableSnapshot>>;

    /// Persist the full state of one table, replacing any earlier copy
    fn save(&self, snapshot: &TableSnapshot) -> Result<()>;

    /// Forget a dropped table
    fn remove(&self, table_name: &str) -> Result<()>;
}

/// One `<table>.json` file per table in a directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    pretty: bool,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, pretty: true })
    }

    /// Toggle pretty-printed output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn table_path(&self, table_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table_name))
    }
}

impl SnapshotStore for JsonStore {
    fn load_all(&self) -> Result<Vec<TableSnapshot>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut snapshots = Vec::with_capacity(paths.len());
        for path in paths {
            let json = fs::read_to_string(&path)?;
            let snapshot: TableSnapshot = serde_json::from_str(&json)?;
            if self.table_path(&snapshot.name) != path {
                warn!(path = %path.display(), table = %snapshot.name, "snapshot file name does not match its table");
            }
            snapshots.push(snapshot);
        }
        debug!(dir = %self.dir.display(), tables = snapshots.len(), "loaded snapshots");
        Ok(snapshots)
    }

    fn save(&self, snapshot: &TableSnapshot) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(snapshot)?
        } else {
            serde_json::to_string(snapshot)?
        };

        // Write then rename so a crash never leaves a half-written table
        let path = self.table_path(&snapshot.name);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        debug!(table = %snapshot.name, rows = snapshot.rows.len(), "saved snapshot");
        Ok(())
    }

    fn remove(&self, table_name: &str) -> Result<()> {
        let path = self.table_path(table_name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
