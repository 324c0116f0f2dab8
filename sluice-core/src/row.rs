use crate::{Error, Result, Value};
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// How the connection should deliver each row.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    /// Rows carry their column labels.
    #[default]
    Labeled,
    /// Rows are bare positional arrays.
    Array,
}

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .and_then(|i| self.values.get(i))
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

/// Rows of a [`ResultSet`], in the shape the connection produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    Labeled(Vec<RowLabeled>),
    Values(Vec<Row>),
}

impl Rows {
    pub fn len(&self) -> usize {
        match self {
            Rows::Labeled(v) => v.len(),
            Rows::Values(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Rows {
    fn default() -> Self {
        Rows::Labeled(Vec::new())
    }
}

/// Everything the connection returns for one statement.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ResultSet {
    /// Labels of the returned columns, empty for statements without output.
    pub columns: RowNames,
    pub rows: Rows,
    /// Rows returned or, for modify statements, rows affected.
    pub row_count: u64,
}

impl ResultSet {
    /// The rows as positional arrays, dropping the labels if present.
    pub fn into_values(self) -> Vec<Row> {
        match self.rows {
            Rows::Labeled(rows) => rows.into_iter().map(Into::into).collect(),
            Rows::Values(rows) => rows,
        }
    }

    /// The rows with their labels, attaching `columns` when the connection returned arrays.
    pub fn into_labeled(self) -> Result<Vec<RowLabeled>> {
        match self.rows {
            Rows::Labeled(rows) => Ok(rows),
            Rows::Values(rows) => {
                let columns = self.columns;
                rows.into_iter()
                    .map(|values| {
                        if values.len() != columns.len() {
                            return Err(Error::msg(format!(
                                "Row has {} values but the result declares {} columns",
                                values.len(),
                                columns.len()
                            )));
                        }
                        Ok(RowLabeled::new(columns.clone(), values))
                    })
                    .collect()
            }
        }
    }
}

/// Result of a [`Session`](crate::Session) query with each row already shaped as `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    pub columns: RowNames,
    pub rows: Vec<T>,
    pub row_count: u64,
}
