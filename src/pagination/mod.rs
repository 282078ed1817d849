//! Pagination module
//!
//! Cursor navigation over every paginated branch of one query.
//!
//! # Overview
//!
//! - **Extraction**: `extract_pagination` reads `pageInfo` cursors from a
//!   response into a `PaginationState`
//! - **Navigation**: a `Session` steps forward and backward, pruning
//!   exhausted branches going forward and restoring them going back

mod extract;
mod session;
mod types;

pub use extract::extract_pagination;
pub use session::{Direction, Session};
pub use types::{Page, PaginationState, PrunedBranch};

#[cfg(test)]
mod tests;
