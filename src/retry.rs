//! Fetch + retry helper
//!
//! Wraps a single paginated fetch with classification-driven retry so the
//! poll loops never see transient errors. This is the only place retry and
//! backoff policy is encoded:
//!
//! - precondition-failed: retry immediately with the same params
//! - connection error: exponential backoff, large ceiling
//! - rate-limited: exponential backoff, smaller ceiling
//! - offset not found: clear affinity and offset, then retry
//! - anything else: exponential backoff, generic ceiling
//! - success: validate the affinity token against the session binding
//!
//! Exceeding a ceiling re-raises as `RetriesExhausted`, which the
//! orchestrator treats as worker death and answers with a full restart.

use crate::client::{Page, ResourceClient};
use crate::cursor::CursorState;
use crate::error::{Error, Result};
use crate::session::Session;
use std::time::Duration;
use tracing::warn;

/// Backoff ceilings for the retry classes
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// First backoff delay; doubles each attempt
    pub initial_backoff: Duration,
    /// Ceiling for connection errors
    pub connect_ceiling: Duration,
    /// Ceiling for rate-limited responses
    pub rate_limit_ceiling: Duration,
    /// Ceiling for unclassified failures
    pub generic_ceiling: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_secs(1),
            connect_ceiling: Duration::from_secs(300),
            rate_limit_ceiling: Duration::from_secs(60),
            generic_ceiling: Duration::from_secs(120),
        }
    }
}

/// Doubling backoff that gives up once the next delay would pass its ceiling
#[derive(Debug)]
struct Backoff {
    delay: Duration,
    ceiling: Duration,
    waited: Duration,
}

impl Backoff {
    fn new(initial: Duration, ceiling: Duration) -> Self {
        Self {
            delay: initial,
            ceiling,
            waited: Duration::ZERO,
        }
    }

    fn next_delay(&mut self) -> Option<Duration> {
        if self.delay > self.ceiling {
            return None;
        }
        let delay = self.delay;
        self.delay = self.delay.saturating_mul(2);
        self.waited += delay;
        Some(delay)
    }
}

async fn retry_or_raise(backoff: &mut Backoff, err: Error) -> Result<()> {
    match backoff.next_delay() {
        Some(delay) => {
            warn!(error = %err, "fetch failed, retrying in {:?}", delay);
            tokio::time::sleep(delay).await;
            Ok(())
        }
        None => Err(Error::RetriesExhausted {
            waited_seconds: backoff.waited.as_secs(),
            message: err.to_string(),
        }),
    }
}

/// Fetch one page, tolerating transient failure
///
/// Shared by both poll loops. On success the affinity token observed on the
/// response is compared against the session binding: first observation
/// records it, divergence is a fatal replica mismatch and no items from
/// that response are surfaced.
pub async fn get_page(
    client: &dyn ResourceClient,
    session: &Session,
    cursor: &mut CursorState,
    policy: &RetryPolicy,
) -> Result<Page> {
    let mut connect = Backoff::new(policy.initial_backoff, policy.connect_ceiling);
    let mut rate = Backoff::new(policy.initial_backoff, policy.rate_limit_ceiling);
    let mut generic = Backoff::new(policy.initial_backoff, policy.generic_ceiling);

    loop {
        let bound = session.affinity().await;
        match client.fetch_page(&cursor.params(), bound.as_deref()).await {
            Ok(page) => {
                match (&bound, &page.affinity) {
                    (Some(expected), Some(observed)) if expected != observed => {
                        return Err(Error::replica_mismatch(expected, observed));
                    }
                    (None, Some(observed)) => session.record(observed.clone()).await,
                    _ => {}
                }
                return Ok(page);
            }
            Err(Error::PreconditionFailed { .. }) => {
                // The server usually accepts the same cursor on the next try.
                warn!("precondition failed, retrying with same params");
            }
            Err(Error::OffsetNotFound { .. }) => {
                // Cursor invalidated server-side: forget the replica binding
                // and the offset so the next fetch behaves like a bootstrap.
                warn!("offset not found, clearing affinity and offset");
                session.clear().await;
                cursor.clear_offset();
            }
            Err(err @ Error::Http(_)) => retry_or_raise(&mut connect, err).await?,
            Err(err @ Error::RateLimited { .. }) => retry_or_raise(&mut rate, err).await?,
            Err(err) if err.is_session_fatal() => return Err(err),
            Err(err) => retry_or_raise(&mut generic, err).await?,
        }
    }
}
