mod as_value;
mod client;
mod error;
mod fields;
mod from_row;
mod logger;
mod prepared;
mod query;
mod row;
mod session;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use client::*;
pub use error::*;
pub use fields::*;
pub use from_row::*;
pub use logger::*;
pub use prepared::*;
pub use query::*;
pub use row::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
