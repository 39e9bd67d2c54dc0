//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap bridge round trips and approval waits with a deadline
//! - Treat a zero bound as "no local deadline"
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    pub secs: u64,
}

impl std::fmt::Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out after {} seconds", self.secs)
    }
}

impl std::error::Error for TimedOut {}

/// Await `fut` for at most `secs` seconds; `0` waits forever.
pub async fn with_deadline<F>(secs: u64, fut: F) -> Result<F::Output, TimedOut>
where
    F: Future,
{
    if secs == 0 {
        return Ok(fut.await);
    }

    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .map_err(|_| TimedOut { secs })
}
