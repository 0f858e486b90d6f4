//! Bounded retry of units of work that fail on contention.

use std::future::Future;
use std::time::Duration;

use livery_core::config::EngineConfig;

use crate::error::{ServiceError, ServiceResult};

/// How a unit of work is re-run after a transient storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included.
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`.
    pub backoff: Duration,
    /// Deadline for each attempt.
    pub attempt_timeout: Duration,
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: config.retry_backoff(),
            attempt_timeout: config.operation_timeout(),
        }
    }
}

/// ## Summary
/// Runs `attempt` until it succeeds, fails permanently, or runs out of attempts.
///
/// Each attempt is dropped, and with it its open transaction, when it exceeds
/// the policy's deadline; a timed-out attempt is not retried.
///
/// ## Errors
/// Returns the attempt's own error when it is not transient,
/// `ServiceError::TransactionFailure` once the attempts are exhausted,
/// and `ServiceError::Timeout` when an attempt overruns its deadline.
pub async fn run_with_retry<T, F, Fut>(
    operation: &'static str,
    policy: RetryPolicy,
    mut attempt: F,
) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        let Ok(result) = tokio::time::timeout(policy.attempt_timeout, attempt()).await else {
            tracing::warn!(
                operation,
                attempt = attempts,
                timeout_ms = u64::try_from(policy.attempt_timeout.as_millis()).unwrap_or(u64::MAX),
                "Operation timed out; transaction rolled back"
            );
            return Err(ServiceError::Timeout(policy.attempt_timeout));
        };

        match result {
            Err(ServiceError::DatabaseError(source)) if source.is_transient() => {
                if attempts >= policy.max_attempts {
                    tracing::error!(operation, attempts, error = %source, "Giving up after transient failures");
                    return Err(ServiceError::TransactionFailure { attempts, source });
                }
                tracing::warn!(operation, attempt = attempts, error = %source, "Transient failure, retrying");
                tokio::time::sleep(policy.backoff * attempts).await;
            }
            other => {
                if attempts > 1 && other.is_ok() {
                    tracing::info!(operation, attempts, "Operation succeeded after retry");
                }
                return other;
            }
        }
    }
}
