//! # Collaborator Call Policy
//!
//! Timeouts and the single-retry rule for collaborator calls.
//!
//! | Call               | Timeout          | Automatic retries |
//! |--------------------|------------------|-------------------|
//! | Directory lookups  | `lookup_timeout` | 1, if retryable   |
//! | Notifications      | `notify_timeout` | 0                 |
//! | Payout issuance    | settlement       | 0                 |

use crate::infrastructure::gateways::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Timeouts applied to the party directory and notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollaboratorPolicy {
    /// Upper bound on one directory call.
    pub lookup_timeout: Duration,
    /// Upper bound on one notification delivery.
    pub notify_timeout: Duration,
}

impl Default for CollaboratorPolicy {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(2_000),
            notify_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Runs `call`, failing with `GatewayError::Timeout` once `limit` elapses.
///
/// # Errors
///
/// Returns the call's own error, or a timeout.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, call: F) -> GatewayResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::timeout_with_duration(
            format!("{operation} timed out"),
            u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

/// Runs a read-only call with a timeout, retrying once on a retryable error.
///
/// # Errors
///
/// Returns the last attempt's error.
pub async fn read_with_single_retry<T, F, Fut>(
    limit: Duration,
    operation: &str,
    mut call: F,
) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    match with_timeout(limit, operation, call()).await {
        Err(e) if e.is_retryable() => {
            debug!(operation, error = %e, "Retrying read-only collaborator call");
            with_timeout(limit, operation, call()).await
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn timeout_is_reported() {
        let result: GatewayResult<()> = with_timeout(Duration::from_millis(10), "slow", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn retries_once_on_retryable_error() {
        let attempts = AtomicUsize::new(0);
        let result = read_with_single_retry(Duration::from_secs(1), "lookup", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(GatewayError::connection("reset"))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_second_failure() {
        let attempts = AtomicUsize::new(0);
        let result: GatewayResult<()> =
            read_with_single_retry(Duration::from_secs(1), "lookup", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::connection("reset"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: GatewayResult<()> =
            read_with_single_retry(Duration::from_secs(1), "lookup", || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(GatewayError::authentication("bad key"))
            })
            .await;
        assert!(!result.unwrap_err().is_retryable());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
