use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::conflict::ConflictError;

/// Service layer errors.
///
/// Every failure of an orchestrated operation is one of these; none of them
/// leaves a partially applied change behind.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transaction failed after {attempts} attempt(s): {source}")]
    TransactionFailure {
        attempts: u32,
        #[source]
        source: livery_db::DbError,
    },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    DatabaseError(#[from] livery_db::DbError),

    #[error(transparent)]
    CoreError(livery_core::error::CoreError),
}

impl ServiceError {
    pub(crate) const fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Whether the failure came from contention and the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::DatabaseError(err) if err.is_transient())
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Conflict(_) => "conflict",
            Self::ValidationError(_) => "validation",
            Self::TransactionFailure { .. } | Self::DatabaseError(_) => "transaction_failure",
            Self::Timeout(_) => "timeout",
            Self::CoreError(_) => "internal",
        }
    }
}

impl From<livery_core::error::CoreError> for ServiceError {
    fn from(err: livery_core::error::CoreError) -> Self {
        use livery_core::error::CoreError;

        match err {
            CoreError::ValidationError(message) => Self::ValidationError(message),
            other => Self::CoreError(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
