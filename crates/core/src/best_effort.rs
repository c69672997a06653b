//! "Try, log, default" wrapper for calls whose failure must not fail the caller.

use std::fmt::Display;
use std::future::Future;

/// Awaits `operation`; on error logs a warning tagged with `label` and returns `None`.
pub async fn best_effort<T, E, F>(label: &str, operation: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match operation.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation = label, error = %e, "best-effort operation failed");
            None
        }
    }
}

/// Like [`best_effort`] but substitutes `T::default()` on error.
pub async fn best_effort_or_default<T, E, F>(label: &str, operation: F) -> T
where
    F: Future<Output = Result<T, E>>,
    E: Display,
    T: Default,
{
    best_effort(label, operation).await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_through() {
        let value = best_effort("ok", async { Ok::<_, String>(3) }).await;
        assert_eq!(value, Some(3));
    }

    #[tokio::test]
    async fn test_error_becomes_default() {
        let value: Vec<u8> =
            best_effort_or_default("fails", async { Err::<Vec<u8>, _>("boom") }).await;
        assert!(value.is_empty());
    }
}
