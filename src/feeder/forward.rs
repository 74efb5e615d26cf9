//! Forward poll loop
//!
//! Perpetual task that keeps pace with newly created and updated items.
//! Designed never to return on its own; any error that escapes the retry
//! helper ends the task, which the orchestrator answers with a restart.

use super::{sleep_or_cancelled, WorkerShared};
use crate::cursor::CursorState;
use crate::error::Result;
use crate::retry::get_page;
use std::time::Duration;
use tracing::debug;

/// Idle-delay controller for the forward loop
///
/// Additive increase/additive decrease: shrink by one unit after any
/// non-empty response (not below the floor), grow by one unit after an
/// empty response (never above the initial value). Inert unless adaptive
/// mode is on.
#[derive(Debug)]
pub(crate) struct IdleWait {
    current: Duration,
    floor: Duration,
    initial: Duration,
    adaptive: bool,
}

const STEP: Duration = Duration::from_secs(1);

impl IdleWait {
    pub(crate) fn new(initial: Duration, floor: Duration, adaptive: bool) -> Self {
        Self {
            current: initial,
            floor,
            initial,
            adaptive,
        }
    }

    pub(crate) fn current(&self) -> Duration {
        self.current
    }

    /// A non-empty response: data is flowing, poll sooner when idle
    pub(crate) fn on_items(&mut self) {
        if self.adaptive {
            self.current = self.current.saturating_sub(STEP).max(self.floor);
        }
    }

    /// An empty response: back off toward the configured idle delay
    pub(crate) fn on_empty(&mut self) {
        if self.adaptive {
            self.current = (self.current + STEP).min(self.initial);
        }
    }
}

/// Run the forward loop until cancelled or a fatal error escapes
pub(crate) async fn run_forward(
    shared: WorkerShared,
    mut cursor: CursorState,
    priority: u8,
) -> Result<()> {
    let mut idle = IdleWait::new(
        shared.tuning.up_wait_sleep,
        shared.tuning.up_wait_sleep_min,
        shared.tuning.adaptive,
    );

    loop {
        if shared.cancel.is_cancelled() {
            return Ok(());
        }

        let page = get_page(
            shared.client.as_ref(),
            &shared.session,
            &mut cursor,
            &shared.policy,
        )
        .await?;

        // Liveness, not data: an empty page still proves the remote side
        // is answering.
        shared.heartbeat.touch().await;

        if page.is_empty() {
            idle.on_empty();
            debug!(wait = ?idle.current(), "feed caught up, idling");
            if sleep_or_cancelled(&shared.cancel, idle.current()).await {
                return Ok(());
            }
        } else {
            debug!(items = page.items.len(), "forward page");
            for item in page.items {
                shared.queue.push(priority, item).await?;
            }
            cursor.advance(page.next_offset);
            idle.on_items();
            if sleep_or_cancelled(&shared.cancel, shared.tuning.up_requests_sleep).await {
                return Ok(());
            }
        }
    }
}
