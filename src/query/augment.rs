//! Query augmentation
//!
//! Rewrites a document so every root field that can paginate takes a
//! cursor variable and selects `pageInfo { nextCursor prevCursor }`.
//! Anything already present is left alone, which makes the rewrite
//! idempotent.

use super::document::{
    content_end, declared_variables, line_indent, name_text, node_range, operations, parse,
    top_level_fields, Edits,
};
use crate::error::Result;
use crate::schema::{
    ArgumentSlot, SchemaTypeMap, CURSOR_ARGUMENT, LIMIT_ARGUMENT, NEXT_CURSOR_FIELD,
    PAGE_INFO_FIELD, PREV_CURSOR_FIELD,
};
use apollo_parser::cst;
use apollo_parser::SyntaxToken;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Augment `query`, returning it unchanged if it cannot be parsed
pub fn augment_query(query: &str, type_map: &SchemaTypeMap) -> String {
    match try_augment_query(query, type_map) {
        Ok(augmented) => augmented,
        Err(e) => {
            warn!("Leaving query unpaginated: {e}");
            query.to_string()
        }
    }
}

/// Augment `query`, failing if it cannot be parsed
pub fn try_augment_query(query: &str, type_map: &SchemaTypeMap) -> Result<String> {
    let document = parse(query)?;
    let ops = operations(&document);

    let mut taken: HashSet<String> = ops.iter().flat_map(declared_variables).collect();
    let mut edits = Edits::default();

    for op in &ops {
        let mut minted = Vec::new();

        for branch in top_level_fields(op) {
            let Some(slot) = type_map.pagination_slot(&branch.name) else {
                continue;
            };
            let Some(target) = ArgumentTarget::locate(&branch.field, &slot) else {
                debug!(branch = %branch.response_key, "No writable argument list; skipping");
                continue;
            };
            if !target.has(LIMIT_ARGUMENT) {
                debug!(branch = %branch.response_key, "No limit given; skipping");
                continue;
            }

            if !target.has(CURSOR_ARGUMENT) {
                let variable = mint_variable(&branch.name, &mut taken);
                target.append(&mut edits, query, &format!("{CURSOR_ARGUMENT}: ${variable}"));
                debug!(branch = %branch.response_key, %variable, "Injected cursor");
                minted.push(variable);
            }

            add_page_info(&branch.field, query, &mut edits);
        }

        if !minted.is_empty() {
            declare_variables(op, query, &minted, &mut edits);
        }
    }

    Ok(edits.apply(query))
}

/// Argument list or input object holding `cursor` and `limit`
enum ArgumentTarget {
    Arguments(cst::Arguments),
    Object(cst::ObjectValue),
}

impl ArgumentTarget {
    fn locate(field: &cst::Field, slot: &ArgumentSlot) -> Option<Self> {
        let arguments = field.arguments()?;
        match slot {
            ArgumentSlot::Argument => Some(Self::Arguments(arguments)),
            ArgumentSlot::InputField { argument } => {
                let arg = arguments
                    .arguments()
                    .find(|a| name_text(a.name()).as_deref() == Some(argument.as_str()))?;
                // A variable-bound input cannot be extended in place
                match arg.value()? {
                    cst::Value::ObjectValue(object) => Some(Self::Object(object)),
                    _ => None,
                }
            }
        }
    }

    fn has(&self, name: &str) -> bool {
        match self {
            Self::Arguments(args) => args
                .arguments()
                .any(|a| name_text(a.name()).as_deref() == Some(name)),
            Self::Object(object) => object
                .object_fields()
                .any(|f| name_text(f.name()).as_deref() == Some(name)),
        }
    }

    fn close(&self) -> Option<SyntaxToken> {
        match self {
            Self::Arguments(args) => args.r_paren_token(),
            Self::Object(object) => object.r_curly_token(),
        }
    }

    fn append(&self, edits: &mut Edits, src: &str, item: &str) {
        if let Some(close) = self.close() {
            edits.append_to_list(src, &close, item);
        }
    }
}

/// `TokenBalances` -> `tokenBalancesCursor`, suffixed until unused
fn mint_variable(field_name: &str, taken: &mut HashSet<String>) -> String {
    let mut chars = field_name.chars();
    let base = match chars.next() {
        Some(first) => format!("{}{}Cursor", first.to_lowercase(), chars.as_str()),
        None => "cursor".to_string(),
    };

    let mut candidate = base.clone();
    let mut suffix = 1;
    while taken.contains(&candidate) {
        candidate = format!("{base}{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn selected(selection_set: &cst::SelectionSet, response_key: &str) -> Option<cst::Field> {
    selection_set.selections().find_map(|selection| match selection {
        cst::Selection::Field(field) => {
            let key = field
                .alias()
                .and_then(|a| name_text(a.name()))
                .or_else(|| name_text(field.name()));
            (key.as_deref() == Some(response_key)).then_some(field)
        }
        _ => None,
    })
}

/// Append `text` as the last selection, one per line if the set is multi-line
fn append_selection(selection_set: &cst::SelectionSet, src: &str, text: &str, edits: &mut Edits) {
    let Some(close) = selection_set.r_curly_token() else {
        return;
    };
    let at = content_end(&close);
    let span = node_range(selection_set);

    if src[span].contains('\n') {
        let last = selection_set
            .selections()
            .last()
            .map_or(at, |s| node_range(&s).start);
        let indent = line_indent(src, last);
        let text = text.replace('\n', &format!("\n{indent}"));
        edits.insert(at, format!("\n{indent}{text}"));
    } else {
        let inline = text.lines().map(str::trim).collect::<Vec<_>>().join(" ");
        edits.insert(at, format!(" {inline}"));
    }
}

fn add_page_info(field: &cst::Field, src: &str, edits: &mut Edits) {
    let Some(selection_set) = field.selection_set() else {
        return;
    };

    let Some(page_info) = selected(&selection_set, PAGE_INFO_FIELD) else {
        let block = format!("{PAGE_INFO_FIELD} {{\n  {NEXT_CURSOR_FIELD}\n  {PREV_CURSOR_FIELD}\n}}");
        append_selection(&selection_set, src, &block, edits);
        return;
    };

    let Some(inner) = page_info.selection_set() else {
        return;
    };
    for cursor_field in [NEXT_CURSOR_FIELD, PREV_CURSOR_FIELD] {
        if selected(&inner, cursor_field).is_none() {
            append_selection(&inner, src, cursor_field, edits);
        }
    }
}

fn declare_variables(op: &cst::OperationDefinition, src: &str, names: &[String], edits: &mut Edits) {
    let declarations = names
        .iter()
        .map(|name| format!("${name}: String"))
        .collect::<Vec<_>>()
        .join(", ");

    if let Some(close) = op.variable_definitions().and_then(|defs| defs.r_paren_token()) {
        edits.append_to_list(src, &close, &declarations);
        return;
    }

    if let Some(name) = op.name() {
        edits.insert(node_range(&name).end, format!("({declarations})"));
    } else if let Some(op_type) = op.operation_type() {
        edits.insert(node_range(&op_type).end, format!(" ({declarations})"));
    } else if let Some(selection_set) = op.selection_set() {
        // Shorthand `{ ... }` has nowhere to declare variables
        edits.insert(
            node_range(&selection_set).start,
            format!("query ({declarations}) "),
        );
    }
}
