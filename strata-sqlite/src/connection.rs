use crate::SqliteStatement;
use strata_core::{Error, Handle, Result, Value};

/// A SQLite database opened by [`crate::SqliteDriver`].
pub struct SqliteHandle {
    pub(crate) connection: rusqlite::Connection,
}

impl SqliteHandle {
    pub(crate) fn new(connection: rusqlite::Connection) -> Self {
        Self { connection }
    }
}

impl Handle for SqliteHandle {
    type Statement<'h> = SqliteStatement<'h>;

    fn prepare<'h>(&'h mut self, sql: &str) -> Result<SqliteStatement<'h>> {
        let statement = self.connection.prepare(sql)?;
        Ok(SqliteStatement::new(statement))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        Ok(self.connection.execute_batch(sql)?)
    }

    fn last_insert_id(&mut self) -> Result<Value> {
        Ok(Value::Int64(Some(self.connection.last_insert_rowid())))
    }

    fn close(self) -> Result<()> {
        self.connection
            .close()
            .map_err(|(_, e)| Error::new(e).context("While closing the sqlite database"))
    }
}
