//! Retry for transient SQLite lock contention
//!
//! Writes from the kiosk and the staff console can collide on the database
//! file. Lock errors are retried with exponential backoff (10 ms doubling to
//! a 1 s cap) until `max_wait_ms` has elapsed; every other error is returned
//! immediately.

use gatepass_common::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Default retry budget for visit writes
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

pub fn is_lock_error(err: &Error) -> bool {
    match err {
        Error::Database(db_err) => {
            let message = db_err.to_string();
            message.contains("database is locked") || message.contains("database is busy")
        }
        _ => false,
    }
}

pub async fn retry_on_lock<F, Fut, T>(operation_name: &str, max_wait_ms: u64, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = 10u64;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if is_lock_error(&err) => {
                let elapsed = start_time.elapsed();
                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Database still locked, giving up"
                    );
                    return Err(Error::Locked {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(1000);
            }
            Err(err) => return Err(err),
        }
    }
}
