//! Pagination types
//!
//! Defines the per-response pagination state, the page snapshot handed to
//! callers, and the record kept when a forward step prunes branches.

use crate::error::FetchError;
use crate::types::{CursorMap, JsonValue};
use std::collections::BTreeSet;

/// Pagination state derived from one response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// At least one branch has a next cursor
    pub has_next_page: bool,
    /// At least one branch has a previous cursor
    pub has_prev_page: bool,
    /// Branch to next cursor, only for branches that have one
    pub next_cursors: CursorMap,
    /// Branch to previous cursor, only for branches that have one
    pub prev_cursors: CursorMap,
    /// Branches that reported page info at all
    pub branches: BTreeSet<String>,
}

impl PaginationState {
    /// Branches that reported page info but have no next cursor
    pub fn exhausted_branches(&self) -> BTreeSet<String> {
        self.branches
            .iter()
            .filter(|branch| !self.next_cursors.contains_key(*branch))
            .cloned()
            .collect()
    }
}

/// Pre-pruning query and the cursors of the step that pruned it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedBranch {
    /// Query text before the exhausted branches were removed
    pub query: String,
    /// Cursors used for the forward step that removed them
    pub cursors: CursorMap,
}

/// Snapshot of one fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Response data, `None` on failure
    pub data: Option<JsonValue>,
    /// Failure, if any
    pub error: Option<FetchError>,
    /// A forward step is possible
    pub has_next_page: bool,
    /// A backward step is possible
    pub has_prev_page: bool,
}

impl Page {
    /// Successful page
    pub fn success(data: Option<JsonValue>, state: &PaginationState) -> Self {
        Self {
            data,
            error: None,
            has_next_page: state.has_next_page,
            has_prev_page: state.has_prev_page,
        }
    }

    /// Failed page; flags describe where navigation stands after the failure
    pub fn failure(error: FetchError, state: &PaginationState) -> Self {
        Self {
            data: None,
            error: Some(error),
            has_next_page: state.has_next_page,
            has_prev_page: state.has_prev_page,
        }
    }

    /// Check if the page carries an error
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Value of one branch in the data
    pub fn branch(&self, key: &str) -> Option<&JsonValue> {
        self.data.as_ref()?.get(key)
    }
}
