//! TinyRDB - A minimal relational database engine written in Rust
//!
//! This library provides the core components for a small SQL database:
//! - SQL parsing (lexer, parser, AST)
//! - Storage (typed values, rows, tables, hash indexes, snapshots)
//! - Statement execution, including a two-table nested-loop join
//! - System catalog (schemas and column types)

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use executor::{Database, QueryResult};
