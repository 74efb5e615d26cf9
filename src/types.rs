//! Common types used throughout feedsync
//!
//! Shared type aliases and the feed direction enum used across modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// A single item from the feed
///
/// The item schema belongs to the resource, not to this crate; the feeder
/// moves items through untouched.
pub type ResourceItem = serde_json::Value;

// ============================================================================
// Direction
// ============================================================================

/// Direction of feed traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward newer items; the forward loop runs forever in this direction
    #[default]
    Forward,
    /// Toward older items; the backward loop drains the backlog then stops
    Backward,
}

impl Direction {
    /// Whether fetches in this direction use descending order
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Backward)
    }
}

// ============================================================================
// Queue Priorities
// ============================================================================

/// Priority assigned to forward-sourced entries (dequeued sooner)
pub const PRIORITY_FORWARD: u8 = 0;

/// Priority assigned to backward-sourced entries (dequeued later)
pub const PRIORITY_BACKWARD: u8 = 10;
