use thiserror::Error;

/// Failure categories of the data-access layer.
///
/// Engine errors keep their original message as the root cause; one of these
/// variants is attached as context, so callers classify with
/// `error.downcast_ref::<DatabaseError>()`.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The connection was used after `close()`.
    #[error("Connection `{name}` is closed")]
    ConnectionLost { name: String },
    /// The engine rejected a statement.
    #[error("Error while executing the query:\n{query}")]
    Execution { query: String },
    /// Begin, commit, savepoint or strict rollback failed.
    #[error("Transaction error during {operation}")]
    Transaction { operation: String },
    /// Entity metadata does not allow the operation.
    #[error("{0}")]
    Entity(String),
}

impl DatabaseError {
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, DatabaseError::ConnectionLost { .. })
    }
}

/// The [`DatabaseError`] attached to `error`, if any.
pub fn database_error(error: &crate::Error) -> Option<&DatabaseError> {
    error.downcast_ref::<DatabaseError>()
}
