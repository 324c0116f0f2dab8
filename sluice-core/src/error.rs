use thiserror::Error;

/// Failure kinds surfaced by a [`Session`](crate::Session) and its prepared queries.
///
/// It travels inside [`crate::Error`], use `downcast_ref::<SessionError>()` to inspect it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The connection refused, dropped or could not serve the request.
    #[error("Connection error: {message}")]
    Connection { message: String },
    /// The backend rejected the statement.
    #[error("Query execution error{}: {message}", .code.as_deref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    QueryExecution {
        code: Option<String>,
        message: String,
    },
    /// A named placeholder had no value at call time.
    #[error("No value for placeholder `{name}` was provided")]
    UnresolvedPlaceholder { name: String },
}

impl SessionError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
    pub fn query_execution(code: Option<String>, message: impl Into<String>) -> Self {
        Self::QueryExecution {
            code,
            message: message.into(),
        }
    }
}
