use crate::{ValueHolder, postgres_type_to_value};
use sluice_core::{
    Error, QueryRequest, Result, ResultSet, Row, RowLabeled, RowMode, RowNames, Rows,
    SessionError, Value, stream::StreamExt, truncate_long,
};
use std::{io, pin::pin};
use tokio_postgres::{Client, Statement};

/// Maps a driver error into the session taxonomy.
///
/// Server answers carry their SQLSTATE. A closed client or a failing socket is a connection
/// error. Anything else failed on the client side while encoding or decoding, and has no code.
pub(crate) fn postgres_error(error: tokio_postgres::Error) -> Error {
    if let Some(e) = error.as_db_error() {
        return SessionError::query_execution(Some(e.code().code().to_string()), e.message())
            .into();
    }
    let io = std::error::Error::source(&error).is_some_and(|s| s.is::<io::Error>());
    if error.is_closed() || io {
        SessionError::connection(error.to_string()).into()
    } else {
        SessionError::query_execution(None, error.to_string()).into()
    }
}

/// Errors raised while establishing a connection, whatever their cause.
pub(crate) fn connection_error(error: tokio_postgres::Error) -> Error {
    match error.as_db_error() {
        Some(e) => SessionError::connection(format!("{} ({})", e.message(), e.code().code())),
        None => SessionError::connection(error.to_string()),
    }
    .into()
}

pub(crate) fn row_to_values(row: tokio_postgres::Row) -> Result<Row> {
    (0..row.len())
        .map(|i| match row.try_get::<_, ValueHolder>(i) {
            Ok(v) => Ok(v.0),
            Err(e) => {
                let col = &row.columns()[i];
                Err(Error::new(e).context(format!(
                    "Could not deserialize column {} `{}`: {}",
                    i,
                    col.name(),
                    col.type_()
                )))
            }
        })
        .collect()
}

pub(crate) async fn prepare(client: &Client, sql: &str) -> Result<Statement> {
    client.prepare(sql).await.map_err(|e| {
        let e = postgres_error(e).context(format!(
            "While preparing the query:\n{}",
            truncate_long!(sql)
        ));
        log::error!("{:#}", e);
        e
    })
}

/// Binds `params` to an already prepared statement, runs it and collects the rows in the shape
/// the request asked for.
pub(crate) async fn run_statement(
    client: &Client,
    statement: &Statement,
    request: QueryRequest<'_>,
    params: Vec<Value>,
) -> Result<ResultSet> {
    run(client, statement, request.row_mode, params)
        .await
        .map_err(|e| {
            let e = e.context(format!(
                "While running the query:\n{}",
                truncate_long!(request.sql)
            ));
            log::error!("{:#}", e);
            e
        })
}

async fn run(
    client: &Client,
    statement: &Statement,
    row_mode: RowMode,
    params: Vec<Value>,
) -> Result<ResultSet> {
    let types = statement.params();
    if types.len() != params.len() {
        return Err(SessionError::query_execution(
            None,
            format!(
                "The statement expects {} parameters but {} were provided",
                types.len(),
                params.len()
            ),
        )
        .into());
    }
    let params = params
        .into_iter()
        .zip(types)
        .enumerate()
        .map(|(i, (value, ty))| -> Result<ValueHolder> {
            let target = postgres_type_to_value(ty);
            if matches!(target, Value::Null) && !value.is_null() {
                return Err(SessionError::query_execution(
                    None,
                    format!("The parameter ${} has type `{}`, which cannot be bound", i + 1, ty),
                )
                .into());
            }
            value.try_as(&target).map(ValueHolder).map_err(|e| {
                SessionError::query_execution(
                    None,
                    format!("Cannot bind the parameter ${} as `{}`: {:#}", i + 1, ty, e),
                )
                .into()
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let columns: RowNames = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    let stream = client
        .query_raw(statement, params)
        .await
        .map_err(postgres_error)?;
    let mut stream = pin!(stream);
    let mut rows = Vec::new();
    while let Some(row) = stream.next().await.transpose().map_err(postgres_error)? {
        rows.push(row_to_values(row)?);
    }
    let row_count = stream.rows_affected().unwrap_or(rows.len() as u64);
    let rows = match row_mode {
        RowMode::Labeled => Rows::Labeled(
            rows.into_iter()
                .map(|values| RowLabeled::new(columns.clone(), values))
                .collect(),
        ),
        RowMode::Array => Rows::Values(rows),
    };
    Ok(ResultSet {
        columns,
        rows,
        row_count,
    })
}
