mod connection;
mod driver;
mod extract;
mod prepared;
mod sql_writer;

pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
