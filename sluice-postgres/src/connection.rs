use crate::util::{connection_error, prepare, run_statement};
use openssl::ssl::{SslConnector, SslFiletype, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use sluice_core::{Client, Context, Error, QueryRequest, Result, ResultSet, Value};
use std::{
    collections::HashMap,
    env,
    path::Path,
    str::FromStr,
    sync::{Mutex, PoisonError},
};
use tokio::spawn;
use tokio_postgres::{NoTls, Statement};
use url::Url;

/// A single Postgres connection.
///
/// Named statements are prepared once and cached under their name for the lifetime of the
/// connection, unnamed statements are prepared on every call.
#[derive(Debug)]
pub struct PostgresConnection {
    pub(crate) client: tokio_postgres::Client,
    statements: Mutex<HashMap<String, (String, Statement)>>,
}

impl PostgresConnection {
    /// Connect to a `postgres://` url.
    ///
    /// The query parameters `sslmode`, `sslrootcert`, `sslcert` and `sslkey` configure TLS, with
    /// `PGSSLMODE`, `PGSSLROOTCERT`, `PGSSLCERT` and `PGSSLKEY` as fallbacks.
    pub async fn connect(url: &str) -> Result<PostgresConnection> {
        let context = || format!("While trying to connect to `{}`", url);
        let options = ConnectOptions::parse(url).with_context(context)?;
        let client = match options.tls {
            None => {
                let (client, connection) = tokio_postgres::connect(options.url.as_str(), NoTls)
                    .await
                    .map_err(connection_error)
                    .with_context(context)?;
                spawn(async move {
                    if let Err(e) = connection.await
                        && !e.is_closed()
                    {
                        log::error!("Postgres connection error: {:#}", e);
                    }
                });
                client
            }
            Some(connector) => {
                let (client, connection) = tokio_postgres::connect(options.url.as_str(), connector)
                    .await
                    .map_err(connection_error)
                    .with_context(context)?;
                spawn(async move {
                    if let Err(e) = connection.await
                        && !e.is_closed()
                    {
                        log::error!("Postgres connection error: {:#}", e);
                    }
                });
                client
            }
        };
        Ok(Self {
            client,
            statements: Default::default(),
        })
    }

    async fn statement(&self, request: &QueryRequest<'_>) -> Result<Statement> {
        let Some(name) = request.name else {
            return prepare(&self.client, request.sql).await;
        };
        let cached = {
            let statements = self.statements.lock().unwrap_or_else(PoisonError::into_inner);
            statements
                .get(name)
                .filter(|(sql, _)| sql == request.sql)
                .map(|(_, statement)| statement.clone())
        };
        if let Some(statement) = cached {
            return Ok(statement);
        }
        let statement = prepare(&self.client, request.sql).await?;
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), (request.sql.to_string(), statement.clone()));
        Ok(statement)
    }

    /// Number of named statements currently cached.
    pub fn cached_statements(&self) -> usize {
        self.statements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Client for PostgresConnection {
    async fn query(&self, request: QueryRequest<'_>, params: Vec<Value>) -> Result<ResultSet> {
        let statement = self.statement(&request).await?;
        run_statement(&self.client, &statement, request, params).await
    }
}

/// How much of the server's certificate to check, the libpq `sslmode` values.
///
/// `allow` and `prefer` are read as `require`: a connection string asking for TLS gets it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    #[default]
    Disable,
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = Error;
    fn from_str(value: &str) -> Result<Self> {
        Ok(match value {
            "disable" => SslMode::Disable,
            "allow" | "prefer" | "require" => SslMode::Require,
            "verify-ca" => SslMode::VerifyCa,
            "verify-full" => SslMode::VerifyFull,
            _ => return Err(Error::msg(format!("Unknown sslmode `{}`", value))),
        })
    }
}

/// Connection url stripped of the TLS parameters, plus the connector they describe.
pub struct ConnectOptions {
    pub url: Url,
    pub ssl_mode: SslMode,
    pub(crate) tls: Option<MakeTlsConnector>,
}

impl ConnectOptions {
    /// Parse a `postgres://` (or `postgresql://`) url.
    ///
    /// The url is kept percent-encoded, the driver decodes the credentials itself.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut url = Url::parse(raw)?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            let error = Error::msg(format!(
                "Postgres connection url must start with `postgres://`, found `{}://`",
                url.scheme()
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let mut take = |key: &str, env_var: &str| {
            pairs
                .iter()
                .position(|(k, _)| k == key)
                .map(|i| pairs.remove(i).1)
                .or_else(|| env::var(env_var).ok())
        };
        let ssl_mode = take("sslmode", "PGSSLMODE")
            .map(|v| v.parse::<SslMode>())
            .transpose()?
            .unwrap_or_default();
        let root_cert = take("sslrootcert", "PGSSLROOTCERT");
        let cert = take("sslcert", "PGSSLCERT");
        let key = take("sslkey", "PGSSLKEY");
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        let tls = match ssl_mode {
            SslMode::Disable => None,
            mode => Some(tls_connector(
                mode,
                root_cert.as_deref(),
                cert.as_deref(),
                key.as_deref(),
            )?),
        };
        Ok(Self { url, ssl_mode, tls })
    }
}

fn tls_connector(
    mode: SslMode,
    root_cert: Option<&str>,
    cert: Option<&str>,
    key: Option<&str>,
) -> Result<MakeTlsConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    if let Some(path) = root_cert.map(Path::new)
        && path.exists()
    {
        builder.set_ca_file(path)?;
    }
    if let Some(path) = cert.map(Path::new)
        && path.exists()
    {
        builder.set_certificate_chain_file(path)?;
    }
    if let Some(path) = key.map(Path::new)
        && path.exists()
    {
        builder.set_private_key_file(path, SslFiletype::PEM)?;
    }
    builder.set_verify(match mode {
        SslMode::Disable | SslMode::Require => SslVerifyMode::NONE,
        SslMode::VerifyCa | SslMode::VerifyFull => SslVerifyMode::PEER,
    });
    let mut connector = MakeTlsConnector::new(builder.build());
    if mode != SslMode::VerifyFull {
        connector.set_callback(|config, _| {
            config.set_verify_hostname(false);
            Ok(())
        });
    }
    Ok(connector)
}
