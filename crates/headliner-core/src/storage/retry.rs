//! Retry of read queries that hit transient SQLite errors
//!
//! Concurrent per-source ingestions share one database file; a reader can
//! observe SQLITE_BUSY while another task commits its batch. Batch writes are
//! not retried here: they run in a transaction whose failure is reported to the
//! caller as a whole.

use std::future::Future;
use std::time::Duration;

/// Maximum number of retry attempts for read queries
pub const MAX_RETRIES: u32 = 5;

/// Check if a SQLite error is transient and should be retried
///
/// - SQLITE_BUSY (5) / SQLITE_BUSY_SNAPSHOT (1032)
/// - SQLITE_LOCKED (6)
/// - SQLITE_IOERR (10) and its READ (266) / SHORT_READ (522) / LOCK (5386) variants
pub fn is_transient_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string());
            matches!(
                code.as_deref(),
                Some("5") | Some("6") | Some("10") | Some("266") | Some("522") | Some("1032") | Some("5386")
            )
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

/// Exponential backoff: 100ms, 200ms, 400ms, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * 2u64.pow(attempt.saturating_sub(1)))
}

/// Execute a query operation with exponential backoff retry for transient errors
pub async fn query_with_retry<F, Fut, T>(operation: F) -> std::result::Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if is_transient_error(&e) && attempts < MAX_RETRIES => {
                attempts += 1;
                let delay = backoff_delay(attempts);
                tracing::debug!(
                    error = %e,
                    attempt = attempts,
                    max_retries = MAX_RETRIES,
                    delay_ms = delay.as_millis(),
                    "Database transient error, retrying query"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
