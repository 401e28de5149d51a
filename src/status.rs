//! Bounded, fixed-interval status polling.
//!
//! The gateway processes invoices asynchronously, so the caller asks again
//! until the status leaves the "processing" state. There is no backoff: with
//! the default policy (60 attempts, 1 s apart) a run waits at most about a
//! minute.
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::KsefError;
use crate::gateway::{KsefGateway, SessionInvoiceStatus};

/// How often and how many times to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two consecutive queries.
    pub interval: Duration,
    /// Total number of queries; 0 is treated as 1.
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Run `query` until `is_pending` is false or the attempts run out.
///
/// Returns the first non-pending value, or the last (still pending) value
/// once `policy.max_attempts` queries have been made; running out of attempts
/// is not an error. Query errors are returned immediately. Sleeps
/// `policy.interval` between queries, never after the last one.
pub async fn poll_until<T, E, F, Fut, P>(
    policy: PollPolicy,
    mut query: F,
    is_pending: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&T) -> bool,
{
    let attempts = policy.attempts();
    let mut attempt = 1;
    loop {
        let value = query().await?;
        if !is_pending(&value) {
            debug!(attempt, "poll settled");
            return Ok(value);
        }
        if attempt >= attempts {
            warn!(attempts, "still pending after the last attempt");
            return Ok(value);
        }
        debug!(attempt, "still pending");
        tokio::time::sleep(policy.interval).await;
        attempt += 1;
    }
}

/// Poll one invoice of a session until it is no longer processing.
///
/// A result that is still processing after the last attempt is returned
/// as-is; [`SessionInvoiceStatus::is_processing`] tells the caller.
pub async fn poll_invoice_status<G: KsefGateway>(
    gateway: &G,
    session_reference: &str,
    invoice_reference: &str,
    access_token: &str,
    policy: PollPolicy,
) -> Result<SessionInvoiceStatus, KsefError> {
    let status = poll_until(
        policy,
        move || gateway.session_invoice_status(session_reference, invoice_reference, access_token),
        SessionInvoiceStatus::is_processing,
    )
    .await?;
    debug!(
        code = status.status.code,
        description = %status.status.description,
        "invoice status"
    );
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn stops_at_first_settled_value() {
        let calls = Cell::new(0);
        let start = tokio::time::Instant::now();
        let result: Result<u32, ()> = poll_until(
            PollPolicy::new(Duration::from_secs(2), 10),
            || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok(n) }
            },
            |n| *n < 3,
        )
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<u32, &str> = poll_until(
            PollPolicy::default(),
            || {
                calls.set(calls.get() + 1);
                async { Err("boom") }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_queries_once() {
        let calls = Cell::new(0);
        let result: Result<&str, ()> = poll_until(
            PollPolicy::new(Duration::from_secs(1), 0),
            || {
                calls.set(calls.get() + 1);
                async { Ok("pending") }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok("pending"));
        assert_eq!(calls.get(), 1);
    }
}
