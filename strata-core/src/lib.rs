mod as_value;
mod clock;
mod compiler;
mod connection;
mod converter;
mod driver;
mod entity;
mod error;
mod events;
mod fragment;
mod logger;
mod order_columns;
mod persistence;
mod prepared;
mod ransacker;
mod registry;
mod result_set;
mod row;
mod sql_writer;
mod transaction;
mod typed_parameter;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use clock::*;
pub use compiler::*;
pub use connection::*;
pub use converter::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use events::*;
pub use fragment::*;
pub use logger::*;
pub use order_columns::*;
pub use prepared::*;
pub use ransacker::*;
pub use registry::*;
pub use result_set::*;
pub use row::*;
pub use sql_writer::*;
pub use typed_parameter::*;
pub use util::*;
pub use value::*;
pub use ::rust_decimal;
pub use ::time;
pub use ::uuid;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
