//! Resource client
//!
//! The feed's HTTP collaborator: one capability, fetching a single page of
//! the paginated feed. The trait keeps the poll loops testable against a
//! scripted client; `HttpResourceClient` is the reqwest implementation.

mod http;

pub use http::{HttpResourceClient, ACCESS_KEY_HEADER, AFFINITY_HEADER};

use crate::error::Result;
use crate::types::{ResourceItem, StringMap};
use async_trait::async_trait;
use serde::Deserialize;

/// A decoded page of the feed
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Items in server order; may be empty
    pub items: Vec<ResourceItem>,
    /// Continuation for the next fetch in the current direction
    pub next_offset: Option<String>,
    /// Continuation for the opposite direction
    pub prev_offset: Option<String>,
    /// Affinity token observed on this response
    pub affinity: Option<String>,
}

impl Page {
    /// Whether this page carried no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Wire envelope of a feed response
///
/// Typed with only the fields this core needs; item schema stays opaque.
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    /// Server-side status code for the fetch
    #[serde(default)]
    pub status: u16,
    /// Items in server order
    #[serde(default)]
    pub items: Vec<ResourceItem>,
    /// Continuation cursor in the requested direction
    #[serde(default)]
    pub next_page: Option<PageRef>,
    /// Continuation cursor in the opposite direction
    #[serde(default)]
    pub prev_page: Option<PageRef>,
}

/// A continuation cursor reference
#[derive(Debug, Deserialize)]
pub struct PageRef {
    /// Opaque offset token
    pub offset: Option<String>,
}

impl FeedEnvelope {
    /// Convert the envelope into a `Page`, attaching the observed affinity
    pub fn into_page(self, affinity: Option<String>) -> Page {
        Page {
            items: self.items,
            next_offset: self.next_page.and_then(|p| p.offset),
            prev_offset: self.prev_page.and_then(|p| p.offset),
            affinity,
        }
    }
}

/// Authenticated capability fetching one page of the feed
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch a page using the given cursor params, presenting the session's
    /// affinity token if one is bound
    ///
    /// Errors must be distinguishable by class: precondition-failed,
    /// rate-limited, not-found, connection error, or generic.
    async fn fetch_page(&self, params: &StringMap, affinity: Option<&str>) -> Result<Page>;
}

#[cfg(test)]
mod tests;
