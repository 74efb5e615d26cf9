//! Feeder orchestrator
//!
//! Owns the session, queue, and the three tasks (forward, backward,
//! watchdog); exposes the single consumer-facing contract: a pull-style,
//! effectively infinite sequence of items.
//!
//! Failure semantics: worker death is a restart trigger, never fatal to the
//! process. Restart is unconditional and unlimited; rate limiting lives
//! inside the retry helper. The consumer never sees an error, only (at
//! worst) a stalled stream, which the watchdog bounds.

mod backward;
mod forward;
mod watchdog;

use crate::client::{HttpResourceClient, ResourceClient};
use crate::config::{FeedTuning, FeederConfig};
use crate::cursor::CursorState;
use crate::error::Result;
use crate::queue::FeedQueue;
use crate::retry::{get_page, RetryPolicy};
use crate::session::{Heartbeat, Session};
use crate::types::{ResourceItem, PRIORITY_BACKWARD, PRIORITY_FORWARD};
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared with the worker tasks
#[derive(Clone)]
pub(crate) struct WorkerShared {
    pub(crate) client: Arc<dyn ResourceClient>,
    pub(crate) session: Session,
    pub(crate) queue: Arc<FeedQueue>,
    pub(crate) heartbeat: Heartbeat,
    pub(crate) cancel: CancellationToken,
    pub(crate) tuning: FeedTuning,
    pub(crate) policy: RetryPolicy,
}

/// Sleep that returns `true` if the token was cancelled first
pub(crate) async fn sleep_or_cancelled(cancel: &CancellationToken, wait: Duration) -> bool {
    tokio::select! {
        () = cancel.cancelled() => true,
        () = tokio::time::sleep(wait) => false,
    }
}

/// Running pipeline state; rebuilt on every start
struct FeederState {
    queue: Arc<FeedQueue>,
    cancel: CancellationToken,
    forward: Option<JoinHandle<Result<()>>>,
    backward: Option<JoinHandle<Result<()>>>,
    watchdog: JoinHandle<()>,
    /// Set once the backward drain has been observed finished; after a
    /// clean finish the backward slot is no longer monitored.
    backward_done: bool,
}

/// Bidirectional change-feed synchronizer
pub struct Feeder {
    client: Arc<dyn ResourceClient>,
    config: FeederConfig,
    policy: RetryPolicy,
    state: Option<FeederState>,
}

impl Feeder {
    /// Create a feeder with the default HTTP resource client
    pub fn new(config: FeederConfig) -> Result<Self> {
        let client = Arc::new(HttpResourceClient::new(&config)?);
        Ok(Self::with_client(config, client))
    }

    /// Create a feeder with a custom resource client
    pub fn with_client(config: FeederConfig, client: Arc<dyn ResourceClient>) -> Self {
        Self {
            client,
            config,
            policy: RetryPolicy::default(),
            state: None,
        }
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn priorities(&self) -> (u8, u8) {
        if self.config.tuning.with_priority {
            (PRIORITY_FORWARD, PRIORITY_BACKWARD)
        } else {
            (0, 0)
        }
    }

    /// Bootstrap the session and spawn the three tasks
    ///
    /// The bootstrap fetch runs in the backward direction with an empty
    /// offset: its `prev` continuation seeds the forward cursor, its `next`
    /// continuation seeds the backlog cursor, and its items are enqueued at
    /// backward priority.
    pub async fn start(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }

        let tuning = self.config.tuning.clone();
        let session = Session::new();
        let queue = Arc::new(FeedQueue::new(tuning.queue_size));
        let (forward_priority, backward_priority) = self.priorities();

        let mut boot_cursor = CursorState::new(true, self.config.extra_filters.clone());
        let page = get_page(
            self.client.as_ref(),
            &session,
            &mut boot_cursor,
            &self.policy,
        )
        .await?;
        info!(
            items = page.items.len(),
            resource = %self.config.resource,
            "bootstrap fetch complete"
        );

        let forward_cursor = CursorState {
            offset: page.prev_offset.clone(),
            descending: false,
            extra: self.config.extra_filters.clone(),
        };
        let backward_cursor = CursorState {
            offset: page.next_offset.clone(),
            descending: true,
            extra: self.config.extra_filters.clone(),
        };

        for item in page.items {
            queue.push(backward_priority, item).await?;
        }

        let heartbeat = Heartbeat::new();
        let cancel = CancellationToken::new();
        let shared = WorkerShared {
            client: Arc::clone(&self.client),
            session,
            queue: Arc::clone(&queue),
            heartbeat: heartbeat.clone(),
            cancel: cancel.clone(),
            tuning: tuning.clone(),
            policy: self.policy.clone(),
        };

        let forward = tokio::spawn(forward::run_forward(
            shared.clone(),
            forward_cursor,
            forward_priority,
        ));
        let backward = tokio::spawn(backward::run_backward(
            shared,
            backward_cursor,
            backward_priority,
        ));
        let watchdog = tokio::spawn(watchdog::run_watchdog(
            heartbeat,
            cancel.clone(),
            tuning.watchdog_interval,
            tuning.stall_threshold,
        ));

        self.state = Some(FeederState {
            queue,
            cancel,
            forward: Some(forward),
            backward: Some(backward),
            watchdog,
            backward_done: false,
        });
        Ok(())
    }

    /// Tear everything down and start a fresh pipeline
    pub async fn restart(&mut self) -> Result<()> {
        info!("restarting feed pipeline");
        self.teardown();
        self.start().await
    }

    /// Stop all tasks; the feeder can be started again later
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(state) = self.state.take() {
            state.cancel.cancel();
            state.queue.close();
            if let Some(handle) = state.forward {
                handle.abort();
            }
            if let Some(handle) = state.backward {
                handle.abort();
            }
            state.watchdog.abort();
        }
    }

    /// Check worker liveness, restarting the pipeline when required
    ///
    /// Backward finishing cleanly is expected exactly once; after that the
    /// slot is ignored. Backward finishing with an error, or forward
    /// finishing at all, means restart.
    async fn supervise(&mut self) -> Result<()> {
        if self.state.is_none() {
            self.start().await?;
        }

        let mut restart = false;
        if let Some(state) = self.state.as_mut() {
            if !state.backward_done
                && state
                    .backward
                    .as_ref()
                    .is_some_and(tokio::task::JoinHandle::is_finished)
            {
                state.backward_done = true;
                if let Some(handle) = state.backward.take() {
                    match handle.await {
                        Ok(Ok(())) => debug!("backward worker finished cleanly"),
                        Ok(Err(err)) => {
                            warn!(error = %err, "backward worker failed");
                            restart = true;
                        }
                        Err(join_err) => {
                            warn!(error = %join_err, "backward worker panicked");
                            restart = true;
                        }
                    }
                }
            }

            // Forward is expected to run forever; termination is always
            // abnormal. Watchdog stalls surface here too, as a cancelled
            // forward task.
            if !restart
                && state
                    .forward
                    .as_ref()
                    .is_some_and(tokio::task::JoinHandle::is_finished)
            {
                if let Some(handle) = state.forward.take() {
                    match handle.await {
                        Ok(Ok(())) => warn!("forward worker exited"),
                        Ok(Err(err)) => warn!(error = %err, "forward worker failed"),
                        Err(join_err) => warn!(error = %join_err, "forward worker panicked"),
                    }
                }
                restart = true;
            }
        }

        if restart {
            self.restart().await?;
        }
        Ok(())
    }

    /// Pull the next item from the feed
    ///
    /// Never returns an error: all failure is absorbed by retry-or-restart,
    /// and sustained failure manifests only as waiting.
    pub async fn next_item(&mut self) -> ResourceItem {
        loop {
            if let Err(err) = self.supervise().await {
                error!(error = %err, "pipeline (re)start failed, retrying");
                tokio::time::sleep(self.policy.initial_backoff).await;
                continue;
            }

            let queue = self
                .state
                .as_ref()
                .map(|state| Arc::clone(&state.queue));
            if let Some(queue) = queue {
                let wait = self.config.tuning.drain_wait;
                if let Some(entry) = queue.pop_timeout(wait).await {
                    return entry.item;
                }
            }
        }
    }

    /// Consume the feeder as an effectively infinite stream of items
    pub fn stream(self) -> impl Stream<Item = ResourceItem> {
        futures::stream::unfold(self, |mut feeder| async move {
            let item = feeder.next_item().await;
            Some((item, feeder))
        })
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Feeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feeder")
            .field("resource", &self.config.resource)
            .field("running", &self.state.is_some())
            .finish_non_exhaustive()
    }
}
