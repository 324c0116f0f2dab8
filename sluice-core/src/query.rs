use crate::{AsValue, Result, SessionError, Value, truncate_long};
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Display, Write},
};

/// Values supplied at call time for the named placeholders of a query.
pub type PlaceholderValues = HashMap<String, Value>;

/// A parameter template: either fixed when the query is built or resolved at call time.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Literal value, used as-is.
    Value(Value),
    /// Named slot resolved from the [`PlaceholderValues`] of each call.
    Placeholder(Cow<'static, str>),
}

impl Param {
    pub fn placeholder(name: impl Into<Cow<'static, str>>) -> Self {
        Param::Placeholder(name.into())
    }
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Param::Placeholder(..))
    }
}

impl<T: AsValue> From<T> for Param {
    fn from(value: T) -> Self {
        Param::Value(value.as_value())
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Value(value)
    }
}

impl From<&'static str> for Param {
    fn from(value: &'static str) -> Self {
        Param::Value(value.into())
    }
}

/// Resolve the parameter templates into the positional values sent to the connection.
///
/// Fails with [`SessionError::UnresolvedPlaceholder`] on the first placeholder missing from `values`.
pub fn fill_placeholders(params: &[Param], values: &PlaceholderValues) -> Result<Vec<Value>> {
    params
        .iter()
        .map(|param| match param {
            Param::Value(v) => Ok(v.clone()),
            Param::Placeholder(name) => values.get(name.as_ref()).cloned().ok_or_else(|| {
                SessionError::UnresolvedPlaceholder {
                    name: name.to_string(),
                }
                .into()
            }),
        })
        .collect()
}

/// SQL text together with its positional parameter templates (`$1` is `params[0]`).
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
    pub fn with_params(sql: impl Into<String>, params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            sql: sql.into(),
            params: params.into_iter().collect(),
        }
    }
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter_map(|v| match v {
            Param::Placeholder(name) => Some(name.as_ref()),
            Param::Value(..) => None,
        })
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value)
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::new(value)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Incrementally writes a [`Query`], numbering the positional markers.
///
/// ```rust
/// use sluice_core::{Param, Query};
/// let mut builder = Query::builder();
/// builder
///     .push("SELECT id, name FROM users WHERE id = ")
///     .push_bind(Param::placeholder("id"))
///     .push(" AND active = ")
///     .push_bind(true);
/// let query = builder.build();
/// assert_eq!(query.sql, "SELECT id, name FROM users WHERE id = $1 AND active = $2");
/// assert_eq!(query.params.len(), 2);
/// ```
#[derive(Default, Debug)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.query.sql.push_str(sql.as_ref());
        self
    }
    pub fn push_bind(&mut self, param: impl Into<Param>) -> &mut Self {
        self.query.params.push(param.into());
        let _ = write!(self.query.sql, "${}", self.query.params.len());
        self
    }
    pub fn build(self) -> Query {
        self.query
    }
}
