use crate::{SqliteHandle, sql_writer::SqliteSqlWriter};
use rusqlite::OpenFlags;
use strata_core::{Context, Driver, Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Handle = SqliteHandle;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    /// Accepts `sqlite://:memory:` and `sqlite://<path>[?<uri parameters>]`.
    fn connect(&self, url: &str) -> Result<SqliteHandle> {
        let prefix = format!("{}://", Self::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            return Err(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            )));
        };
        let connection = if location == ":memory:" {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open_with_flags(
                format!("file:{location}"),
                OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE,
            )
        }
        .with_context(|| format!("While opening `{}`", url))?;
        Ok(SqliteHandle::new(connection))
    }

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter {}
    }
}
