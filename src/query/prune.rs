//! Query pruning
//!
//! Removes branches that reported page info without a next cursor, so
//! forward requests stop asking for exhausted result sets. Variable
//! definitions and fragments left unused by a removal are dropped as well.

use super::document::{
    declared_variables, fragments, name_text, node_range, operations, parse, top_level_fields,
    used_fragments, used_variables, Edits,
};
use crate::error::Result;
use crate::pagination::extract_pagination;
use crate::types::JsonValue;
use apollo_parser::cst;
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;
use tracing::{debug, warn};

/// Pruned query, or `None` if no branch had to go
pub fn prune_query(query: &str, last_data: Option<&JsonValue>) -> Option<String> {
    let exhausted = extract_pagination(last_data).exhausted_branches();
    if exhausted.is_empty() {
        return None;
    }

    match try_prune_query(query, &exhausted) {
        Ok(pruned) => pruned,
        Err(e) => {
            warn!("Not pruning unparsable query: {e}");
            None
        }
    }
}

/// Remove the named branches from `query`
///
/// An operation whose every selection would be removed is left intact.
pub fn try_prune_query(query: &str, exhausted: &BTreeSet<String>) -> Result<Option<String>> {
    let document = parse(query)?;
    let mut edits = Edits::default();
    let mut pruned_ops = Vec::new();

    for (index, op) in operations(&document).iter().enumerate() {
        let selection_count = op
            .selection_set()
            .map_or(0, |set| set.selections().count());
        let doomed: Vec<_> = top_level_fields(op)
            .into_iter()
            .filter(|branch| exhausted.contains(&branch.response_key))
            .collect();

        if doomed.is_empty() {
            continue;
        }
        if doomed.len() == selection_count {
            debug!("Every branch of the operation is exhausted; keeping it");
            continue;
        }

        for branch in &doomed {
            debug!(branch = %branch.response_key, "Pruning exhausted branch");
            edits.delete(with_leading_space(query, node_range(&branch.field)));
        }
        pruned_ops.push(index);
    }

    if edits.is_empty() {
        return Ok(None);
    }

    let spread = used_fragments(&document);
    let pruned = edits.apply(query);
    drop_orphans(&pruned, &pruned_ops, &spread).map(Some)
}

/// Extend a range backwards over the whitespace and commas before it
fn with_leading_space(src: &str, range: Range<usize>) -> Range<usize> {
    let head = src[..range.start].trim_end_matches([' ', '\t', '\r', '\n', ',']);
    head.len()..range.end
}

/// Remove variable definitions of the pruned operations that nothing
/// references any more, and fragments that were spread before pruning but
/// no longer are
fn drop_orphans(query: &str, op_indexes: &[usize], spread_before: &HashSet<String>) -> Result<String> {
    let document = parse(query)?;
    let ops = operations(&document);
    let mut edits = Edits::default();

    let spread_now = used_fragments(&document);
    for (name, fragment) in fragments(&document) {
        if spread_before.contains(&name) && !spread_now.contains(&name) {
            debug!(fragment = %name, "Dropping fragment no longer spread");
            edits.delete(with_leading_space(query, node_range(&fragment)));
        }
    }

    for op in op_indexes.iter().filter_map(|i| ops.get(*i)) {
        let Some(definitions) = op.variable_definitions() else {
            continue;
        };
        let used = used_variables(&document, op);
        let kept: Vec<cst::VariableDefinition> = definitions
            .variable_definitions()
            .filter(|def| {
                def.variable()
                    .and_then(|v| name_text(v.name()))
                    .is_some_and(|name| used.contains(&name))
            })
            .collect();

        if kept.len() == declared_variables(op).len() {
            continue;
        }

        if kept.is_empty() {
            // `()` is not valid, drop the whole list
            edits.delete(node_range(&definitions));
        } else {
            let list = kept
                .iter()
                .map(|def| query[node_range(def)].trim().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            edits.replace(node_range(&definitions), format!("({list})"));
        }
    }

    Ok(edits.apply(query))
}
