//! Query execution module
//!
//! This module contains the database entry point, the join executor and
//! statement results.

pub mod database;
pub mod join;
pub mod result;

pub use database::{Database, TableInfo};
pub use result::QueryResult;
