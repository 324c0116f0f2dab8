use sluice_core::{
    Client, Logger, QueryRequest, Result, ResultSet, Row, RowLabeled, RowMode, RowNames, Rows,
    Value,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Log {
        sql: String,
        params: Vec<Value>,
    },
    Query {
        sql: String,
        name: Option<String>,
        row_mode: RowMode,
        params: Vec<Value>,
    },
}

pub type Events = Arc<Mutex<Vec<Event>>>;

type Respond = dyn Fn(&QueryRequest<'_>, &[Value]) -> Result<ResultSet> + Send + Sync;

/// Connection double: records every call and answers through `respond`.
pub struct StubClient {
    pub events: Events,
    respond: Box<Respond>,
}

impl StubClient {
    pub fn new(
        events: Events,
        respond: impl Fn(&QueryRequest<'_>, &[Value]) -> Result<ResultSet> + Send + Sync + 'static,
    ) -> Self {
        Self {
            events,
            respond: Box::new(respond),
        }
    }
    pub fn queries(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Event::Query { .. }))
            .count()
    }
}

impl Client for StubClient {
    async fn query(&self, request: QueryRequest<'_>, params: Vec<Value>) -> Result<ResultSet> {
        self.events.lock().unwrap().push(Event::Query {
            sql: request.sql.into(),
            name: request.name.map(Into::into),
            row_mode: request.row_mode,
            params: params.clone(),
        });
        tokio::task::yield_now().await;
        (self.respond)(&request, &params)
    }
}

pub struct RecordingLogger {
    pub events: Events,
}

impl Logger for RecordingLogger {
    fn log_query(&self, sql: &str, params: &[Value]) {
        self.events.lock().unwrap().push(Event::Log {
            sql: sql.into(),
            params: params.into(),
        });
    }
}

/// Shape `rows` the way the request asked for.
pub fn result_set(columns: &[&str], rows: Vec<Vec<Value>>, row_mode: RowMode) -> ResultSet {
    let columns: RowNames = columns.iter().map(|c| c.to_string()).collect();
    let row_count = rows.len() as u64;
    let rows: Vec<Row> = rows.into_iter().map(Into::into).collect();
    ResultSet {
        rows: match row_mode {
            RowMode::Array => Rows::Values(rows),
            RowMode::Labeled => Rows::Labeled(
                rows.into_iter()
                    .map(|v| RowLabeled::new(columns.clone(), v))
                    .collect(),
            ),
        },
        columns,
        row_count,
    }
}
