//! Retry with exponential back-off and jitter for transient supplier failures.
//!
//! Only timeouts, connection failures and 5xx responses are retried. Authorization
//! failures are handled by the catalog client's re-authentication path, and
//! everything else (4xx, decode errors, envelope errors) is returned as-is.

use std::future::Future;
use std::time::Duration;

use crate::error::SupplierError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &SupplierError) -> bool {
    match err {
        SupplierError::Network(e) => e.is_timeout() || e.is_connect(),
        SupplierError::Http { status, .. } => *status >= 500,
        SupplierError::Config(_)
        | SupplierError::Auth { .. }
        | SupplierError::Decode { .. }
        | SupplierError::NotFound { .. }
        | SupplierError::InvalidRecord { .. }
        | SupplierError::Api { .. }
        | SupplierError::InvalidArgument(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The sleep before retry `n` is `backoff_base_ms × 2^(n-1)` ± 25 % jitter,
/// capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SupplierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SupplierError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient supplier error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
