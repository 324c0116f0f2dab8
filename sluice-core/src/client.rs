use crate::{Result, ResultSet, RowMode, Value};
use std::{future::Future, sync::Arc};

/// What the connection is asked to run, parameters excluded.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest<'q> {
    pub sql: &'q str,
    /// Statement name, the connection may cache the parsed statement under it.
    pub name: Option<&'q str>,
    pub row_mode: RowMode,
}

impl<'q> QueryRequest<'q> {
    pub fn new(sql: &'q str) -> Self {
        Self {
            sql,
            name: None,
            row_mode: RowMode::Labeled,
        }
    }
    pub fn name(mut self, name: Option<&'q str>) -> Self {
        self.name = name;
        self
    }
    pub fn row_mode(mut self, row_mode: RowMode) -> Self {
        self.row_mode = row_mode;
        self
    }
}

/// The single capability a [`Session`](crate::Session) needs from a connection: run one
/// parameterized statement and return its rows.
///
/// Implemented by drivers for single connections, pooled connections and pool managers alike.
/// Failures must be reported as [`SessionError::Connection`](crate::SessionError::Connection)
/// or [`SessionError::QueryExecution`](crate::SessionError::QueryExecution).
pub trait Client: Send + Sync {
    fn query(
        &self,
        request: QueryRequest<'_>,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<ResultSet>> + Send;
}

impl<C: Client> Client for Arc<C> {
    fn query(
        &self,
        request: QueryRequest<'_>,
        params: Vec<Value>,
    ) -> impl Future<Output = Result<ResultSet>> + Send {
        (**self).query(request, params)
    }
}
