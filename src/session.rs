//! Shared session state
//!
//! The affinity token binds a session to the backend replica that served
//! the bootstrap request; both poll loops must observe the same token for
//! the whole session. The heartbeat records the forward loop's last
//! successful fetch and is read by the watchdog.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Sticky-session affinity token shared between workers
///
/// Cloning shares the underlying store. Workers compare the token they
/// observe against this value; they never blindly overwrite it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    affinity: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Create an empty session (no replica bound yet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the currently bound affinity token
    pub async fn affinity(&self) -> Option<String> {
        self.affinity.read().await.clone()
    }

    /// Bind the session to a replica
    pub async fn record(&self, token: impl Into<String>) {
        let mut guard = self.affinity.write().await;
        *guard = Some(token.into());
    }

    /// Unbind the session, allowing the next fetch to rebind
    pub async fn clear(&self) {
        let mut guard = self.affinity.write().await;
        *guard = None;
    }
}

/// Last-success timestamp for the forward loop
///
/// Cloning shares the underlying timestamp.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    last: Arc<RwLock<Instant>>,
}

impl Heartbeat {
    /// Create a heartbeat stamped at the current instant
    pub fn new() -> Self {
        Self {
            last: Arc::new(RwLock::new(Instant::now())),
        }
    }

    /// Stamp the heartbeat
    pub async fn touch(&self) {
        let mut guard = self.last.write().await;
        *guard = Instant::now();
    }

    /// Time since the last stamp
    pub async fn elapsed(&self) -> Duration {
        self.last.read().await.elapsed()
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}
