// src/utils/deadline.rs

use std::{future::Future, time::Duration};

use crate::error::AppError;

/// Runs a store call, or a wait on the hash limiter, under `limit`.
///
/// On expiry the future is dropped, which releases its connection, rolls back
/// any open transaction or leaves the limiter queue, and the caller sees
/// `StoreUnavailable`.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StoreUnavailable(format!(
            "{} timed out after {}ms",
            what,
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_results() {
        let ok = bounded(Duration::from_secs(1), "noop", async { Ok::<_, AppError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn expiry_is_store_unavailable() {
        let slow = bounded(Duration::from_millis(5), "slow", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, AppError>(())
        })
        .await;
        assert!(matches!(slow, Err(AppError::StoreUnavailable(_))));
    }
}
