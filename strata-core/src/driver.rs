use crate::{ColumnMeta, Result, RowLabeled, SqlWriter, TypedParameter, Value};
use std::ops::ControlFlow;

/// Entry point of a backend: opens handles and provides the dialect writer.
pub trait Driver: Send {
    type Handle: Handle;
    type SqlWriter: SqlWriter + Send + 'static;

    const NAME: &'static str;

    fn name(&self) -> &'static str {
        Self::NAME
    }
    /// Open a new engine connection for the given URL.
    fn connect(&self, url: &str) -> Result<Self::Handle>;
    fn sql_writer(&self) -> Self::SqlWriter;
}

/// A live engine connection.
pub trait Handle: Send {
    type Statement<'h>: Statement
    where
        Self: 'h;

    /// Prepare a single statement.
    fn prepare<'h>(&'h mut self, sql: &str) -> Result<Self::Statement<'h>>;
    /// Run statements that take no parameters and return no rows
    /// (transaction control).
    fn execute_batch(&mut self, sql: &str) -> Result<()>;
    /// Identifier generated by the last successful insert.
    fn last_insert_id(&mut self) -> Result<Value>;
    fn close(self) -> Result<()>;
}

/// A parameterized, backend-prepared statement.
///
/// Parameters are bound by name (without the leading `:`). Rows are pushed to
/// the callback passed to [`Statement::fetch`], which stops the cursor as soon
/// as it returns [`ControlFlow::Break`].
pub trait Statement {
    fn bind(&mut self, name: &str, value: &TypedParameter) -> Result<&mut Self>;
    /// Run a statement that returns no rows, gives the number of rows affected.
    fn execute(&mut self) -> Result<u64>;
    fn columns(&self) -> Vec<ColumnMeta>;
    fn fetch(
        &mut self,
        callback: &mut dyn FnMut(RowLabeled) -> Result<ControlFlow<()>>,
    ) -> Result<()>;
}

/// Statement type produced by the handles of driver `D`.
pub type StatementOf<'h, D> = <<D as Driver>::Handle as Handle>::Statement<'h>;
