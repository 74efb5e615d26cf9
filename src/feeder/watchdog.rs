//! Forward-loop watchdog
//!
//! Coarse safety net for stalls that don't manifest as a crash: the task is
//! alive but stuck, or the remote side silently stopped answering. Ordinary
//! failures are caught by the retry helper and loop termination; this only
//! bounds the worst case.

use crate::session::Heartbeat;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Check the heartbeat every `interval`; if its age exceeds `threshold`,
/// cancel the session so the orchestrator restarts the pipeline.
pub(crate) async fn run_watchdog(
    heartbeat: Heartbeat,
    cancel: CancellationToken,
    interval: Duration,
    threshold: Duration,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(interval) => {}
        }

        let age = heartbeat.elapsed().await;
        if age > threshold {
            warn!(?age, ?threshold, "forward loop stalled, forcing restart");
            cancel.cancel();
            return;
        }
    }
}
