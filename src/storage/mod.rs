//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Values and rows
//! - Hash indexes
//! - Tables
//! - Snapshot persistence

pub mod index;
pub mod row;
pub mod snapshot;
pub mod table;
pub mod value;

pub use index::HashIndex;
pub use row::{Row, RowId};
pub use snapshot::{IndexSpec, JsonStore, SnapshotStore, TableSnapshot};
pub use table::{InsertValues, Table};
pub use value::Value;
