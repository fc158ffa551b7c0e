//! SQL Abstract Syntax Tree (AST)
//!
//! This module defines the structured statements produced by the parser.

use std::fmt;

use crate::catalog::Column;
use crate::storage::Value;

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// DROP TABLE statement
    DropTable(DropTableStatement),
    /// CREATE INDEX statement
    CreateIndex(CreateIndexStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// SELECT statement
    Select(SelectStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name
    pub table_name: String,
    /// Column definitions
    pub columns: Vec<Column>,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name
    pub table_name: String,
}

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Index name
    pub index_name: String,
    /// Table name
    pub table_name: String,
    /// Indexed column
    pub column: String,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name
    pub table_name: String,
    /// Column names (named form) or None (positional form)
    pub columns: Option<Vec<String>>,
    /// Values to insert
    pub values: Vec<Value>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Select list
    pub projection: Projection,
    /// FROM table
    pub from: String,
    /// Optional two-table equality join
    pub join: Option<JoinClause>,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// The select list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// All columns (*)
    All,
    /// Named columns, in output order
    Columns(Vec<ColumnRef>),
}

/// JOIN clause: `JOIN table ON a.x = b.y`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Table to join
    pub table: String,
    /// Left side of the ON equality
    pub left: ColumnRef,
    /// Right side of the ON equality
    pub right: ColumnRef,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table name
    pub table_name: String,
    /// SET clause (column = value pairs)
    pub assignments: Vec<Assignment>,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// Column assignment (for UPDATE)
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Column name
    pub column: String,
    /// New value
    pub value: Value,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name
    pub table_name: String,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// A single `column operator literal` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnRef,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<ColumnRef>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Test a stored value against this condition
    pub fn matches(&self, stored: &Value) -> bool {
        self.op.evaluate(stored, &self.value)
    }
}

/// Column reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table name (optional)
    pub table: Option<String>,
    /// Column name
    pub column: String,
}

impl ColumnRef {
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

impl From<String> for ColumnRef {
    fn from(column: String) -> Self {
        Self {
            table: None,
            column,
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(column: &str) -> Self {
        Self::from(column.to_string())
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompareOp {
    /// Apply the operator to a stored value and a literal.
    ///
    /// Ordering operators are false when either side is NULL or the types
    /// are not comparable; `!=` is the negation of `=`.
    pub fn evaluate(&self, left: &Value, right: &Value) -> bool {
        use std::cmp::Ordering::*;

        match self {
            CompareOp::Eq => left.sql_eq(right),
            CompareOp::Neq => !left.sql_eq(right),
            CompareOp::Lt => left.compare(right) == Some(Less),
            CompareOp::Gt => left.compare(right) == Some(Greater),
            CompareOp::Lte => matches!(left.compare(right), Some(Less | Equal)),
            CompareOp::Gte => matches!(left.compare(right), Some(Greater | Equal)),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_evaluate() {
        let one = Value::Integer(1);
        let two = Value::Integer(2);

        assert!(CompareOp::Lt.evaluate(&one, &two));
        assert!(CompareOp::Lte.evaluate(&two, &two));
        assert!(CompareOp::Gte.evaluate(&Value::Float(2.5), &two));
        assert!(CompareOp::Neq.evaluate(&one, &two));
        assert!(!CompareOp::Gt.evaluate(&Value::Null, &one));
        assert!(!CompareOp::Lt.evaluate(&Value::from("a"), &one));
        assert!(CompareOp::Neq.evaluate(&Value::from("a"), &one));
    }

    #[test]
    fn test_column_ref_display() {
        assert_eq!(ColumnRef::qualified("users", "id").to_string(), "users.id");
        assert_eq!(ColumnRef::from("name").to_string(), "name");
    }
}
