//! Backward poll loop
//!
//! Finite task that drains the historical backlog captured at bootstrap
//! time. An empty page means the backlog is exhausted; the loop reports
//! success and stops. A failure that escapes the retry helper reports
//! through `Err` and triggers a restart while the drain is still active.

use super::{sleep_or_cancelled, WorkerShared};
use crate::cursor::CursorState;
use crate::error::Result;
use crate::retry::get_page;
use tracing::{debug, info};

/// Run the backward loop until the backlog is drained or cancelled
pub(crate) async fn run_backward(
    shared: WorkerShared,
    mut cursor: CursorState,
    priority: u8,
) -> Result<()> {
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

        if page.is_empty() {
            info!("backlog drained");
            return Ok(());
        }

        debug!(items = page.items.len(), "backward page");
        for item in page.items {
            shared.queue.push(priority, item).await?;
        }
        cursor.advance(page.next_offset);

        if sleep_or_cancelled(&shared.cancel, shared.tuning.down_requests_sleep).await {
            return Ok(());
        }
    }
}
