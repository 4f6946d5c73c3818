use crate::{
    Connection, DatabaseError, Driver, Error, Handle, Params, Result, SqlWriter,
    connection::connection_lost, database_error,
};
use anyhow::Context;
use std::time::Instant;

fn transaction_error(operation: impl Into<String>) -> Error {
    DatabaseError::Transaction {
        operation: operation.into(),
    }
    .into()
}

impl<D: Driver> Connection<D> {
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Open savepoints, outermost first.
    pub fn savepoints(&self) -> &[String] {
        &self.savepoints
    }

    /// Run transaction control statements, failures are tagged with `operation`.
    fn control(&mut self, sql: &str, operation: &str) -> Result<()> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(connection_lost(&self.name));
        };
        let started = Instant::now();
        handle.execute_batch(sql).with_context(|| DatabaseError::Transaction {
            operation: operation.into(),
        })?;
        self.logger
            .log(&self.writer, sql, &Params::new(), started.elapsed());
        Ok(())
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(transaction_error("begin, a transaction is already active"));
        }
        let mut sql = String::new();
        self.writer.write_transaction_begin(&mut sql);
        self.control(&sql, "begin")?;
        self.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(transaction_error("commit, no active transaction"));
        }
        let mut sql = String::new();
        self.writer.write_transaction_commit(&mut sql);
        self.control(&sql, "commit")?;
        self.in_transaction = false;
        self.savepoints.clear();
        Ok(())
    }

    /// Open a named savepoint inside the current transaction.
    pub fn savepoint(&mut self, name: &str) -> Result<()> {
        if !self.in_transaction {
            return Err(transaction_error(format!(
                "savepoint `{name}`, no active transaction"
            )));
        }
        let mut sql = String::new();
        self.writer.write_savepoint(&mut sql, name);
        self.control(&sql, "savepoint")?;
        self.savepoints.push(name.to_string());
        Ok(())
    }

    /// Like [`Connection::rollback`], but engine failures and unknown
    /// savepoints are reported.
    pub fn rollback_strict(&mut self, savepoint: Option<&str>) -> Result<()> {
        let Some(name) = savepoint else {
            if !self.in_transaction {
                return Err(transaction_error("rollback, no active transaction"));
            }
            let mut sql = String::new();
            self.writer.write_transaction_rollback(&mut sql);
            let result = self.control(&sql, "rollback");
            self.in_transaction = false;
            self.savepoints.clear();
            return result;
        };
        let Some(position) = self.savepoints.iter().rposition(|v| v == name) else {
            return Err(transaction_error(format!(
                "rollback to `{name}`, unknown savepoint"
            )));
        };
        let mut sql = String::new();
        self.writer.write_rollback_to_savepoint(&mut sql, name);
        self.control(&sql, "rollback to savepoint")?;
        sql.clear();
        self.writer.write_release_savepoint(&mut sql, name);
        self.control(&sql, "release savepoint")?;
        self.savepoints.truncate(position);
        Ok(())
    }

    /// Undo the whole transaction (`None`) or everything after the named
    /// savepoint, which is released. Failures are logged, not returned, unless
    /// the connection is closed.
    pub fn rollback(&mut self, savepoint: Option<&str>) -> Result<()> {
        if savepoint.is_none() && !self.in_transaction {
            return Ok(());
        }
        match self.rollback_strict(savepoint) {
            Err(e) if database_error(&e).is_some_and(|v| v.is_connection_lost()) => Err(e),
            Err(e) => {
                log::warn!("Quiet rollback on `{}` failed: {:#}", self.name, e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// Run `f` inside a transaction: commit when it succeeds, roll back when
    /// it fails and return its error unchanged.
    pub fn transaction<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.begin()?;
        match f(self) {
            Ok(result) => {
                if let Err(e) = self.commit() {
                    self.rollback(None)?;
                    return Err(e);
                }
                Ok(result)
            }
            Err(e) => {
                self.rollback(None)?;
                Err(e)
            }
        }
    }
}
