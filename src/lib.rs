//! # feedsync
//!
//! Continuous, bidirectional change-feed synchronization for cursor-based,
//! sticky-session HTTP APIs.
//!
//! ## Features
//!
//! - **Bidirectional sync**: a perpetual forward loop tracks new items
//!   while a finite backward loop drains the historical backlog
//! - **Sticky sessions**: the affinity token binding a session to one
//!   backend replica is validated on every fetch
//! - **Retry with classification**: transient failures (connection, rate
//!   limit, stale cursor) are retried with per-class backoff and never
//!   reach the consumer
//! - **Self-healing**: worker death or a stalled forward loop triggers a
//!   full pipeline restart; the consumer only ever sees items
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use feedsync::{Feeder, FeederConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FeederConfig::builder()
//!         .base_url("https://api.example.com")
//!         .access_key("key-...")
//!         .resource("documents")
//!         .build()?;
//!
//!     let mut feeder = Feeder::new(config)?;
//!     feeder.start().await?;
//!
//!     loop {
//!         let item = feeder.next_item().await;
//!         // Process the item
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Feeder (orchestrator)               │
//! │  start() / restart()        next_item() -> ResourceItem │
//! └─────────────────────────────────────────────────────────┘
//!                 │
//! ┌──────────────┬───────┴──────┬──────────────┬────────────┐
//! │ Forward loop │ Backward loop│   Watchdog   │ Feed queue │
//! ├──────────────┼──────────────┼──────────────┼────────────┤
//! │ newest items │ backlog drain│ stall check  │ bounded    │
//! │ adaptive idle│ finite       │ heartbeat    │ priority   │
//! └──────────────┴──────────────┴──────────────┴────────────┘
//!                 │
//!         fetch + retry helper (the only place backoff lives)
//!                 │
//!         ResourceClient (reqwest, affinity header)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for feedsync
pub mod error;

/// Common types and type aliases
pub mod types;

/// Feeder configuration
pub mod config;

/// Cursor state for paginated traversal
pub mod cursor;

/// Resource client (the HTTP collaborator)
pub mod client;

/// Bounded priority queue between workers and consumer
pub mod queue;

/// Shared session state: affinity token and heartbeat
pub mod session;

/// Fetch + retry helper
pub mod retry;

/// Feeder orchestrator and poll loops
pub mod feeder;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{HttpResourceClient, Page, ResourceClient};
pub use config::{FeedTuning, FeederConfig};
pub use error::{Error, Result};
pub use feeder::Feeder;
pub use retry::RetryPolicy;
pub use types::{Direction, ResourceItem, StringMap};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
