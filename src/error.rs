//! Error types for TinyRDB
//!
//! This module defines all error types used throughout the database engine.
//! Every error is recoverable by the caller; the engine never aborts on bad input.

use thiserror::Error;

/// The main error type for TinyRDB
#[derive(Error, Debug)]
pub enum Error {
    // ========== Parser Errors ==========
    #[error("Syntax error: {message} (near '{fragment}')")]
    SyntaxError { message: String, fragment: String },

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Catalog error: table '{0}' declares more than one primary key")]
    MultiplePrimaryKeys(String),

    #[error("Catalog error: column '{column}' not found in table '{table}'")]
    ColumnNotFound { column: String, table: String },

    #[error("Catalog error: column '{0}' is already indexed")]
    IndexAlreadyExists(String),

    // ========== Type Errors ==========
    #[error("Type error: column '{column}' expects {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Type error: expected {expected} values, got {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    // ========== Constraint Errors ==========
    #[error("Constraint error: null value not allowed for column '{0}'")]
    NullConstraintViolation(String),

    #[error("Constraint error: duplicate value {value} for unique column '{column}'")]
    UniqueConstraintViolation { column: String, value: String },

    // ========== Persistence Errors ==========
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a syntax error pointing at the fragment that could not be parsed
    pub fn syntax(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Error::SyntaxError {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    pub(crate) fn column_not_found(column: impl Into<String>, table: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
            table: table.into(),
        }
    }
}

/// Result type alias for TinyRDB operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Catalog error: table 'users' not found");

        let err = Error::syntax("expected FROM", "users");
        assert_eq!(
            err.to_string(),
            "Syntax error: expected FROM (near 'users')"
        );

        let err = Error::UniqueConstraintViolation {
            column: "email".to_string(),
            value: "'a@b.c'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Constraint error: duplicate value 'a@b.c' for unique column 'email'"
        );
    }
}
