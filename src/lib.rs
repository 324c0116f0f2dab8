//! Prepared-query execution: bind parameterized queries to a connection, fill their placeholders
//! at call time and shape the rows into objects, labeled rows or positional arrays.
//!
//! ```rust,ignore
//! use sluice::{DescribeFields, FromRow, Param, PlaceholderValues, Query, Session, SessionOptions};
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: i32,
//!     name: String,
//! }
//!
//! let session = Session::new(connection, SessionOptions::default());
//! let by_id = session.prepare_query::<User>(
//!     Query::with_params("SELECT id, name FROM users WHERE id = $1", [Param::placeholder("id")]),
//!     Some(User::fields()),
//!     Some("user_by_id"),
//! );
//! let users = by_id
//!     .execute(&PlaceholderValues::from([("id".into(), 5.into())]))
//!     .await?
//!     .into_mapped();
//! ```
pub use sluice_core::*;
pub use sluice_macros::*;
