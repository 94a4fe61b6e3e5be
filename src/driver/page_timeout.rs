//! Timeout wrapper for page operations
//!
//! Prevents indefinite hangs on navigation against pages that keep
//! long-polling connections open.

use std::future::Future;
use std::time::Duration;

use super::{DriverError, DriverResult};

/// Wrap an async page operation with an explicit timeout
///
/// # Returns
/// * `Ok(T)` - Operation completed successfully
/// * `Err(DriverError::Timeout)` - The timeout was reached first
/// * `Err(e)` - The operation itself failed
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> DriverResult<T>
where
    F: Future<Output = DriverResult<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout {
            operation: operation_name.to_string(),
            secs: timeout_secs,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn slow_operation_times_out() {
        let result: DriverResult<()> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(120)).await;
                Ok(())
            },
            5,
            "Navigation",
        )
        .await;

        assert!(matches!(result, Err(DriverError::Timeout { secs: 5, .. })));
    }

    #[tokio::test]
    async fn inner_error_is_preserved() {
        let result: DriverResult<()> =
            with_page_timeout(async { Err(DriverError::Closed) }, 5, "Navigation").await;
        assert!(matches!(result, Err(DriverError::Closed)));
    }
}
