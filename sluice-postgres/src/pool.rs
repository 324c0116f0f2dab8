use crate::{
    ConnectOptions,
    util::{connection_error, postgres_error, prepare, run_statement},
};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, PoolError, RecyclingMethod};
use sluice_core::{Client, Context, Error, QueryRequest, Result, ResultSet, SessionError, Value};
use tokio_postgres::NoTls;

/// A connection checked out of a [`PostgresPool`], returned to it when dropped.
///
/// Named statements go through the pool's per-connection statement cache.
pub struct PostgresPooledConnection(pub(crate) Object);

impl Client for PostgresPooledConnection {
    async fn query(&self, request: QueryRequest<'_>, params: Vec<Value>) -> Result<ResultSet> {
        let statement = if request.name.is_some() {
            self.0.prepare_cached(request.sql).await.map_err(|e| {
                let e = postgres_error(e).context(format!(
                    "While preparing the query:\n{}",
                    sluice_core::truncate_long!(request.sql)
                ));
                log::error!("{:#}", e);
                e
            })?
        } else {
            prepare(&self.0, request.sql).await?
        };
        run_statement(&self.0, &statement, request, params).await
    }
}

impl From<Object> for PostgresPooledConnection {
    fn from(value: Object) -> Self {
        Self(value)
    }
}

/// A pool of Postgres connections, every query runs on a connection acquired for it alone.
#[derive(Clone)]
pub struct PostgresPool(pub(crate) Pool);

impl PostgresPool {
    /// Build a pool of at most `max_size` connections to a `postgres://` url, accepting the
    /// same TLS parameters as [`PostgresConnection::connect`](crate::PostgresConnection::connect).
    ///
    /// Connections are opened lazily, the first failure shows up on the first query.
    pub fn connect(url: &str, max_size: usize) -> Result<PostgresPool> {
        let context = || format!("While creating a pool for `{}`", url);
        let options = ConnectOptions::parse(url).with_context(context)?;
        let config: tokio_postgres::Config = options.url.as_str().parse().with_context(context)?;
        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = match options.tls {
            None => Manager::from_config(config, NoTls, manager_config),
            Some(connector) => Manager::from_config(config, connector, manager_config),
        };
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .with_context(context)?;
        Ok(Self(pool))
    }

    /// Acquire a connection, waiting for one to be released if the pool is exhausted.
    pub async fn get(&self) -> Result<PostgresPooledConnection> {
        self.0.get().await.map(Into::into).map_err(|e| {
            let e = pool_error(e);
            log::error!("{:#}", e);
            e
        })
    }

    pub fn max_size(&self) -> usize {
        self.0.status().max_size
    }
}

impl From<Pool> for PostgresPool {
    fn from(value: Pool) -> Self {
        Self(value)
    }
}

impl Client for PostgresPool {
    async fn query(&self, request: QueryRequest<'_>, params: Vec<Value>) -> Result<ResultSet> {
        self.get().await?.query(request, params).await
    }
}

fn pool_error(error: PoolError) -> Error {
    let error = match error {
        PoolError::Backend(e) => connection_error(e),
        e => SessionError::connection(e.to_string()).into(),
    };
    error.context("While acquiring a connection from the pool")
}
