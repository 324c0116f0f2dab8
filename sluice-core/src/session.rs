use crate::{
    Client, Fields, FromRow, Logger, NoopLogger, PreparedQuery, Query, QueryRequest, QueryResult,
    Result, Row, RowMode, Value,
};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct SessionOptions {
    /// Receives every statement before dispatch, defaults to [`NoopLogger`].
    pub logger: Option<Arc<dyn Logger>>,
}

/// Entry point binding queries to one connection handle.
///
/// The connection is shared with every [`PreparedQuery`] created here and its lifetime is managed
/// by the caller. All logging goes through the logger of the session.
pub struct Session<C: Client> {
    client: Arc<C>,
    logger: Arc<dyn Logger>,
}

impl<C: Client> Session<C> {
    pub fn new(client: C, options: SessionOptions) -> Self {
        Self::from_shared(Arc::new(client), options)
    }

    /// Session over a connection that is also used elsewhere.
    pub fn from_shared(client: Arc<C>, options: SessionOptions) -> Self {
        Self {
            client,
            logger: options.logger.unwrap_or_else(|| Arc::new(NoopLogger) as Arc<dyn Logger>),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Bind `query` to the connection. No I/O happens here.
    ///
    /// With `fields`, [`PreparedQuery::execute`] maps every row into `T`, otherwise it returns the
    /// rows as the connection produced them. `name` lets the connection cache the statement.
    pub fn prepare_query<T: FromRow>(
        &self,
        query: Query,
        fields: Option<Fields>,
        name: Option<&str>,
    ) -> PreparedQuery<C, T> {
        PreparedQuery::new(
            self.client.clone(),
            self.logger.clone(),
            query.sql,
            query.params,
            fields,
            name.map(Into::into),
        )
    }

    /// Run an unnamed statement, returning positional rows.
    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<QueryResult<Row>> {
        self.logger.log_query(sql, &params);
        let result = self
            .client
            .query(QueryRequest::new(sql).row_mode(RowMode::Array), params)
            .await?;
        Ok(QueryResult {
            columns: result.columns.clone(),
            row_count: result.row_count,
            rows: result.into_values(),
        })
    }

    /// Run an unnamed statement, converting each labeled row into `T`.
    pub async fn query_objects<T: FromRow>(
        &self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<QueryResult<T>> {
        self.logger.log_query(sql, &params);
        let result = self
            .client
            .query(QueryRequest::new(sql).row_mode(RowMode::Labeled), params)
            .await?;
        let columns = result.columns.clone();
        let row_count = result.row_count;
        Ok(QueryResult {
            columns,
            row_count,
            rows: result
                .into_labeled()?
                .into_iter()
                .map(T::from_row)
                .collect::<Result<_>>()?,
        })
    }
}

impl<C: Client> Clone for Session<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            logger: self.logger.clone(),
        }
    }
}
