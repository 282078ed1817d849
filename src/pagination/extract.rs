//! Pagination extraction
//!
//! Reads `pageInfo { nextCursor prevCursor }` from every top-level branch
//! of a response and folds them into a `PaginationState`.

use super::types::PaginationState;
use crate::schema::{NEXT_CURSOR_FIELD, PAGE_INFO_FIELD, PREV_CURSOR_FIELD};
use crate::types::JsonValue;

/// Compute pagination state from response data
///
/// Branches without a `pageInfo` object are ignored. A missing, null or
/// empty cursor means the branch is exhausted in that direction.
pub fn extract_pagination(data: Option<&JsonValue>) -> PaginationState {
    let mut state = PaginationState::default();
    let Some(JsonValue::Object(branches)) = data else {
        return state;
    };

    for (key, value) in branches {
        let Some(page_info) = value.get(PAGE_INFO_FIELD).and_then(JsonValue::as_object) else {
            continue;
        };
        state.branches.insert(key.clone());

        if let Some(cursor) = non_empty(page_info.get(NEXT_CURSOR_FIELD)) {
            state.next_cursors.insert(key.clone(), cursor.to_string());
        }
        if let Some(cursor) = non_empty(page_info.get(PREV_CURSOR_FIELD)) {
            state.prev_cursors.insert(key.clone(), cursor.to_string());
        }
    }

    state.has_next_page = !state.next_cursors.is_empty();
    state.has_prev_page = !state.prev_cursors.is_empty();
    state
}

fn non_empty(value: Option<&JsonValue>) -> Option<&str> {
    value.and_then(JsonValue::as_str).filter(|s| !s.is_empty())
}
