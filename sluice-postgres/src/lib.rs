mod connection;
mod pool;
mod util;
mod value_holder;

pub use connection::*;
pub use pool::*;
pub use value_holder::*;
