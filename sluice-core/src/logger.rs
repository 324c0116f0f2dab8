use crate::{Value, separated_by, truncate_long};
use log::Level;
use std::fmt::Write;

/// Receives every statement right before it is dispatched.
///
/// Logging is best-effort: the method cannot fail, implementations must swallow their own errors.
pub trait Logger: Send + Sync {
    fn log_query(&self, sql: &str, params: &[Value]);
}

/// Discards everything.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log_query(&self, _sql: &str, _params: &[Value]) {}
}

/// Writes the queries through the `log` facade, target `sluice::query`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    pub level: Level,
}

impl DefaultLogger {
    pub const TARGET: &'static str = "sluice::query";

    pub const fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new(Level::Debug)
    }
}

impl Logger for DefaultLogger {
    fn log_query(&self, sql: &str, params: &[Value]) {
        if !log::log_enabled!(target: Self::TARGET, self.level) {
            return;
        }
        let mut out = String::with_capacity(64);
        separated_by(
            &mut out,
            params,
            |out, v| {
                let _ = write!(out, "{}", v);
            },
            ", ",
        );
        log::log!(
            target: Self::TARGET,
            self.level,
            "Query: {} -- params: [{}]",
            truncate_long!(sql),
            out
        );
    }
}
