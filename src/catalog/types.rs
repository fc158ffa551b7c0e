//! Data types for TinyRDB
//!
//! This module defines the SQL data types supported by the database and the
//! conversion rules applied when a value is stored into a typed column.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::Value;

/// SQL Data Types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// 64-bit signed integer
    Integer,
    /// Unlimited text
    Text,
    /// Boolean type
    Boolean,
    /// Double-precision floating point
    Float,
}

impl DataType {
    /// Convert a value into this type, if the value's runtime type allows it.
    ///
    /// NULL converts to every type; nullability is checked separately by the
    /// column constraints. Integers widen into FLOAT columns. Nothing else is
    /// coerced. Negative zero is stored as zero, so equal floats always share
    /// one bit pattern in index keys.
    pub fn convert(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (DataType::Integer, v @ Value::Integer(_)) => Some(v),
            (DataType::Float, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (DataType::Float, Value::Float(f)) if f == 0.0 => Some(Value::Float(0.0)),
            (DataType::Float, v @ Value::Float(_)) => Some(v),
            (DataType::Boolean, v @ Value::Boolean(_)) => Some(v),
            (DataType::Text, v @ Value::Text(_)) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Float => write!(f, "FLOAT"),
        }
    }
}
