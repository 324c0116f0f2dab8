mod books;
mod concurrent;
mod failures;
mod readings;

use crate::{books::books, concurrent::concurrent, failures::failures, readings::readings};
use log::LevelFilter;
use sluice::{Client, Session};
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs the whole suite against a live database reachable through `session`.
///
/// Tables are dropped and recreated, the same database can serve several runs in a row.
pub async fn execute_tests<C: Client>(session: Session<C>) {
    books(&session).await;
    readings(&session).await;
    concurrent(&session).await;
    failures(&session).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
