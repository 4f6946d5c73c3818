mod batch;
mod closed;
mod conversion;
mod queries;
mod recorder;
mod transaction;
mod user;

use crate::{
    batch::batch,
    closed::closed,
    conversion::conversion,
    queries::queries,
    user::users,
};
use log::LevelFilter;
use std::env;
use strata::{Connection, Driver};

pub use recorder::Recorder;
pub use user::{Tag, User};

#[cfg(not(feature = "disable-savepoints"))]
use transaction::savepoints;
#[cfg(not(feature = "disable-transactions"))]
use transaction::transactions;

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

/// Runs every scenario against `connection`, then closes it.
pub fn execute_tests<D: Driver>(mut connection: Connection<D>) {
    users(&mut connection);
    #[cfg(not(feature = "disable-transactions"))]
    transactions(&mut connection);
    #[cfg(not(feature = "disable-savepoints"))]
    savepoints(&mut connection);
    batch(&mut connection);
    queries(&mut connection);
    conversion(&mut connection);
    closed(connection);
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
