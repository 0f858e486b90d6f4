use thiserror::Error;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Connection error: {0}")]
    ConnectionError(#[from] diesel::ConnectionError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    LockTimeout { what: String, waited_ms: u64 },

    #[error("Corrupt {table} row {id}: {reason}")]
    CorruptRow {
        table: &'static str,
        id: uuid::Uuid,
        reason: String,
    },

    #[error(transparent)]
    CoreError(#[from] livery_core::error::CoreError),
}

impl DbError {
    /// ## Summary
    /// Whether retrying the whole transaction may succeed.
    ///
    /// Serialization failures, deadlocks, lock timeouts and pool exhaustion are
    /// contention, not bad input.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        use diesel::result::{DatabaseErrorKind, Error};

        match self {
            Self::LockTimeout { .. } | Self::PoolError(_) => true,
            Self::DatabaseError(Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _)) => {
                true
            }
            Self::DatabaseError(Error::DatabaseError(_, info)) => {
                let message = info.message();
                message.contains("deadlock detected") || message.contains("lock timeout")
            }
            _ => false,
        }
    }

    pub(crate) fn corrupt(table: &'static str, id: uuid::Uuid, reason: impl ToString) -> Self {
        Self::CorruptRow {
            table,
            id,
            reason: reason.to_string(),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
