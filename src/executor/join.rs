//! Two-table equality join
//!
//! Nested loop over both tables in storage order. Combined rows key every
//! column as `table.column`, left table first, so names never collide.

use tracing::debug;

use crate::error::{Error, Result};
use crate::sql::ast::{ColumnRef, Condition, JoinClause, Projection};
use crate::storage::{Row, Table, Value};

/// Name resolution over the two joined tables
pub struct JoinScope<'a> {
    left: &'a Table,
    right: &'a Table,
}

impl<'a> JoinScope<'a> {
    pub fn new(left: &'a Table, right: &'a Table) -> Self {
        Self { left, right }
    }

    /// Key of `column` in a combined row.
    ///
    /// A qualified name must name one of the two tables. An unqualified
    /// name is looked up in the left table first, then the right.
    pub fn resolve(&self, column: &ColumnRef) -> Result<String> {
        let table = match column.table.as_deref() {
            Some(name) if name == self.left.name() => self.left,
            Some(name) if name == self.right.name() => self.right,
            Some(_) => return Err(Error::column_not_found(column.to_string(), self.label())),
            None if self.left.schema().has_column(&column.column) => self.left,
            None if self.right.schema().has_column(&column.column) => self.right,
            None => return Err(Error::column_not_found(&column.column, self.label())),
        };
        let col = table.resolve(column)?;
        Ok(format!("{}.{}", table.name(), col.name))
    }

    /// Every combined-row key, left table first
    pub fn all_columns(&self) -> Vec<String> {
        [self.left, self.right]
            .iter()
            .flat_map(|t| {
                t.schema()
                    .column_names()
                    .into_iter()
                    .map(move |c| format!("{}.{}", t.name(), c))
            })
            .collect()
    }

    fn label(&self) -> String {
        format!("{} JOIN {}", self.left.name(), self.right.name())
    }
}

/// Combined rows where `left.on.left == right.on.right` and `predicate`
/// holds, in (left, right) storage order. NULL keys never match.
pub fn nested_loop_join(
    left: &Table,
    right: &Table,
    on: &JoinClause,
    predicate: Option<&Condition>,
) -> Result<Vec<Row>> {
    let scope = JoinScope::new(left, right);
    let left_key = left.resolve(&on.left)?.name.clone();
    let right_key = right.resolve(&on.right)?.name.clone();
    let filter = match predicate {
        Some(cond) => Some((cond, scope.resolve(&cond.column)?)),
        None => None,
    };

    let mut joined = Vec::new();
    let mut compared = 0usize;

    for l_row in left.rows() {
        let l_val = l_row.get(&left_key).unwrap_or(&Value::Null);
        if l_val.is_null() {
            continue;
        }

        for r_row in right.rows() {
            compared += 1;
            let r_val = r_row.get(&right_key).unwrap_or(&Value::Null);
            if r_val.is_null() || !l_val.sql_eq(r_val) {
                continue;
            }

            let mut combined = Row::new();
            l_row.extend_prefixed(left.name(), &mut combined);
            r_row.extend_prefixed(right.name(), &mut combined);

            if let Some((cond, key)) = &filter {
                if !cond.matches(combined.get(key).unwrap_or(&Value::Null)) {
                    continue;
                }
            }
            joined.push(combined);
        }
    }

    debug!(
        left = left.name(),
        right = right.name(),
        compared,
        matched = joined.len(),
        "nested loop join"
    );
    Ok(joined)
}

/// Output column labels and the `(source key, label)` pairs to keep.
///
/// Named columns keep the spelling the caller used.
pub fn join_projection(
    scope: &JoinScope<'_>,
    projection: &Projection,
) -> Result<(Vec<String>, Option<Vec<(String, String)>>)> {
    match projection {
        Projection::All => Ok((scope.all_columns(), None)),
        Projection::Columns(refs) => {
            let pairs = refs
                .iter()
                .map(|r| -> Result<(String, String)> { Ok((scope.resolve(r)?, r.to_string())) })
                .collect::<Result<Vec<_>>>()?;
            let labels = pairs.iter().map(|(_, label)| label.clone()).collect();
            Ok((labels, Some(pairs)))
        }
    }
}
