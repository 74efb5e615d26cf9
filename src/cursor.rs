//! Cursor state for paginated feed traversal
//!
//! Each poll loop owns one `CursorState` for its direction. The offset is
//! an opaque continuation token: it is only ever replaced wholesale by the
//! value the server returned with the most recent successful page, never
//! assembled by hand.

use crate::types::StringMap;

/// Per-direction cursor parameters for a feed fetch
#[derive(Debug, Clone, Default)]
pub struct CursorState {
    /// Opaque continuation token; `None` means "start from now"
    pub offset: Option<String>,
    /// Whether this direction walks the feed in descending order
    pub descending: bool,
    /// Caller-supplied filters merged into every fetch
    pub extra: StringMap,
}

impl CursorState {
    /// Create a cursor at the logical "now" point
    pub fn new(descending: bool, extra: StringMap) -> Self {
        Self {
            offset: None,
            descending,
            extra,
        }
    }

    /// Build the query parameters for the next fetch in this direction
    pub fn params(&self) -> StringMap {
        let mut params = self.extra.clone();
        params.insert("descending".to_string(), self.descending.to_string());
        if let Some(offset) = &self.offset {
            params.insert("offset".to_string(), offset.clone());
        }
        params
    }

    /// Replace the offset with a server-supplied continuation
    pub fn advance(&mut self, offset: Option<String>) {
        self.offset = offset;
    }

    /// Drop the offset, forcing the next fetch to behave like a bootstrap
    ///
    /// Used when the server reports the current offset as gone (data
    /// retention invalidated the cursor).
    pub fn clear_offset(&mut self) {
        self.offset = None;
    }
}
