use crate::{
    Client, Fields, FromRow, Logger, Param, PlaceholderValues, QueryRequest, Result, ResultSet,
    Row, RowLabeled, RowMode, fill_placeholders, map_row, truncate_long,
};
use std::{
    fmt::{self, Debug, Display},
    marker::PhantomData,
    sync::Arc,
};

/// Output of [`PreparedQuery::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Execution<T> {
    /// Rows decoded through the field descriptor, one object per row.
    Mapped(Vec<T>),
    /// No field descriptor: whatever the connection returned.
    Raw(ResultSet),
}

impl<T> Execution<T> {
    pub fn into_mapped(self) -> Option<Vec<T>> {
        match self {
            Execution::Mapped(v) => Some(v),
            Execution::Raw(..) => None,
        }
    }
    pub fn into_raw(self) -> Option<ResultSet> {
        match self {
            Execution::Raw(v) => Some(v),
            Execution::Mapped(..) => None,
        }
    }
}

/// A statement bound to a connection, reusable any number of times.
///
/// SQL text, parameter templates and field descriptor are fixed at construction, each call only
/// supplies the placeholder values. Calls hold no shared mutable state and can run concurrently.
///
/// Every execution resolves the placeholders (failing before any I/O if one is missing), logs the
/// final statement, then dispatches it. The variants differ only in the shape of the output:
///
/// | method | rows requested | output |
/// |---|---|---|
/// | [`execute`](Self::execute) | arrays when fields exist | objects `T` or the raw [`ResultSet`] |
/// | [`all`](Self::all) | labeled | [`RowLabeled`] |
/// | [`values`](Self::values) | arrays | [`Row`] |
pub struct PreparedQuery<C: Client, T = RowLabeled> {
    client: Arc<C>,
    logger: Arc<dyn Logger>,
    sql: String,
    name: Option<String>,
    params: Vec<Param>,
    fields: Option<Fields>,
    _row: PhantomData<fn() -> T>,
}

impl<C: Client, T: FromRow> PreparedQuery<C, T> {
    pub(crate) fn new(
        client: Arc<C>,
        logger: Arc<dyn Logger>,
        sql: String,
        params: Vec<Param>,
        fields: Option<Fields>,
        name: Option<String>,
    ) -> Self {
        Self {
            client,
            logger,
            sql,
            name,
            params,
            fields,
            _row: PhantomData,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn params(&self) -> &[Param] {
        &self.params
    }
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    async fn dispatch(&self, values: &PlaceholderValues, row_mode: RowMode) -> Result<ResultSet> {
        let params = fill_placeholders(&self.params, values)?;
        self.logger.log_query(&self.sql, &params);
        let request = QueryRequest::new(&self.sql)
            .name(self.name.as_deref())
            .row_mode(row_mode);
        self.client.query(request, params).await
    }

    /// Run the statement, decoding every row into `T` when a field descriptor is present.
    pub async fn execute(&self, values: &PlaceholderValues) -> Result<Execution<T>> {
        let Some(fields) = &self.fields else {
            return self
                .dispatch(values, RowMode::Labeled)
                .await
                .map(Execution::Raw);
        };
        let result = self.dispatch(values, RowMode::Array).await?;
        result
            .into_values()
            .into_iter()
            .map(|row| map_row(fields, row).and_then(T::from_row))
            .collect::<Result<_>>()
            .map(Execution::Mapped)
    }

    /// Run the statement and return the labeled rows unmapped.
    pub async fn all(&self, values: &PlaceholderValues) -> Result<Vec<RowLabeled>> {
        self.dispatch(values, RowMode::Labeled)
            .await?
            .into_labeled()
    }

    /// Run the statement and return the positional rows unmapped.
    pub async fn values(&self, values: &PlaceholderValues) -> Result<Vec<Row>> {
        self.dispatch(values, RowMode::Array)
            .await
            .map(ResultSet::into_values)
    }
}

impl<C: Client, T> Debug for PreparedQuery<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedQuery")
            .field("sql", &self.sql)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl<C: Client, T> Display for PreparedQuery<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}
