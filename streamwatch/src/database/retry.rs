//! Busy-retry for single statements.
//!
//! Concurrent sweeps append to the same table. The pool's busy timeout covers
//! most contention, but a WAL checkpoint can still hand back `SQLITE_BUSY`; the
//! insert is retried a bounded number of times before the error surfaces.

use rand::random;
use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const BUSY_MAX_RETRIES: u32 = 8;
const BUSY_BASE_DELAY_MS: u64 = 10;
const BUSY_MAX_DELAY_MS: u64 = 1_000;

/// Whether `err` is SQLite reporting a locked or busy database.
pub fn is_busy(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        let code = db_err.code().map(Cow::into_owned);
        if matches!(code.as_deref(), Some("5") | Some("6")) {
            return true;
        }
    }

    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("database is locked") || msg.contains("database is busy")
}

fn backoff(attempt: u32) -> Duration {
    let base = BUSY_BASE_DELAY_MS
        .saturating_mul(1u64 << attempt.min(16))
        .min(BUSY_MAX_DELAY_MS);
    let jitter = random::<u64>() % (base / 4 + 1);
    Duration::from_millis((base + jitter).min(BUSY_MAX_DELAY_MS))
}

/// Run `op` until it succeeds, fails with a non-busy error, or retries run out.
pub async fn with_busy_retry<T, F, Fut>(op_name: &'static str, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_busy(&err) && attempt < BUSY_MAX_RETRIES => {
                let delay = backoff(attempt);
                debug!(
                    op = op_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "SQLite busy, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
