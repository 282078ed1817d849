//! Document inspection and text edits
//!
//! Documents are parsed with `apollo-parser`, whose lossless CST keeps
//! byte ranges for every node. Rewrites are expressed as insertions and
//! deletions at those ranges, so everything the caller wrote (formatting,
//! comments, unrelated selections) survives untouched.

use crate::error::{Error, Result};
use crate::schema::CURSOR_ARGUMENT;
use apollo_parser::cst::{self, CstNode};
use apollo_parser::{Parser, SyntaxKind, SyntaxNode, SyntaxToken};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;

/// Parse a document, failing on any syntax error
pub(crate) fn parse(query: &str) -> Result<cst::Document> {
    let tree = Parser::new(query).parse();
    if let Some(err) = tree.errors().next() {
        return Err(Error::query_parse(err.message().to_string()));
    }
    Ok(tree.document())
}

/// Operation definitions in document order
pub(crate) fn operations(document: &cst::Document) -> Vec<cst::OperationDefinition> {
    document
        .definitions()
        .filter_map(|def| match def {
            cst::Definition::OperationDefinition(op) => Some(op),
            _ => None,
        })
        .collect()
}

/// A field selected directly on an operation
pub(crate) struct TopLevelField {
    pub field: cst::Field,
    /// Alias if present, else the field name
    pub response_key: String,
    pub name: String,
}

/// Fields selected at the top of an operation (fragments are skipped)
pub(crate) fn top_level_fields(op: &cst::OperationDefinition) -> Vec<TopLevelField> {
    let Some(selection_set) = op.selection_set() else {
        return Vec::new();
    };

    selection_set
        .selections()
        .filter_map(|selection| match selection {
            cst::Selection::Field(field) => {
                let name = name_text(field.name())?;
                let response_key = field
                    .alias()
                    .and_then(|alias| name_text(alias.name()))
                    .unwrap_or_else(|| name.clone());
                Some(TopLevelField {
                    field,
                    response_key,
                    name,
                })
            }
            _ => None,
        })
        .collect()
}

pub(crate) fn name_text(name: Option<cst::Name>) -> Option<String> {
    name.map(|n| n.text().to_string())
}

/// Names of the variables an operation declares
pub(crate) fn declared_variables(op: &cst::OperationDefinition) -> Vec<String> {
    op.variable_definitions()
        .map(|defs| {
            defs.variable_definitions()
                .filter_map(|def| name_text(def.variable()?.name()))
                .collect()
        })
        .unwrap_or_default()
}

/// Fragment definitions by name
pub(crate) fn fragments(document: &cst::Document) -> HashMap<String, cst::FragmentDefinition> {
    document
        .definitions()
        .filter_map(|def| match def {
            cst::Definition::FragmentDefinition(fragment) => {
                let name = name_text(fragment.fragment_name()?.name())?;
                Some((name, fragment))
            }
            _ => None,
        })
        .collect()
}

/// Variables and fragments reachable from a set of nodes
#[derive(Debug, Default)]
struct Reach {
    variables: BTreeSet<String>,
    fragments: HashSet<String>,
}

fn operation_roots(op: &cst::OperationDefinition) -> Vec<SyntaxNode> {
    let mut roots = Vec::new();
    if let Some(selection_set) = op.selection_set() {
        roots.push(selection_set.syntax().clone());
    }
    if let Some(directives) = op.directives() {
        roots.push(directives.syntax().clone());
    }
    roots
}

/// Walk `roots`, following fragment spreads transitively
fn reach(
    fragments: &HashMap<String, cst::FragmentDefinition>,
    mut pending: Vec<SyntaxNode>,
) -> Reach {
    let mut reach = Reach::default();

    while let Some(root) = pending.pop() {
        for node in root.descendants() {
            if let Some(var) = cst::Variable::cast(node.clone()) {
                reach.variables.extend(name_text(var.name()));
                continue;
            }
            let Some(name) = cst::FragmentSpread::cast(node)
                .and_then(|spread| spread.fragment_name())
                .and_then(|f| name_text(f.name()))
            else {
                continue;
            };
            let Some(fragment) = fragments.get(&name) else {
                continue;
            };
            if reach.fragments.insert(name) {
                if let Some(selection_set) = fragment.selection_set() {
                    pending.push(selection_set.syntax().clone());
                }
                if let Some(directives) = fragment.directives() {
                    pending.push(directives.syntax().clone());
                }
            }
        }
    }

    reach
}

/// Names of the variables referenced by an operation's body and directives,
/// including inside the fragments it spreads
pub(crate) fn used_variables(
    document: &cst::Document,
    op: &cst::OperationDefinition,
) -> BTreeSet<String> {
    reach(&fragments(document), operation_roots(op)).variables
}

/// Names of the fragments spread by any operation of the document
pub(crate) fn used_fragments(document: &cst::Document) -> HashSet<String> {
    let roots = operations(document).iter().flat_map(operation_roots).collect();
    reach(&fragments(document), roots).fragments
}

/// Variable name of a `$var` value
pub(crate) fn variable_name(value: Option<cst::Value>) -> Option<String> {
    match value? {
        cst::Value::Variable(var) => name_text(var.name()),
        _ => None,
    }
}

/// Branch response key to the variable bound to its `cursor`
///
/// Looks at a direct `cursor` argument first, then at `cursor` fields of
/// object-valued arguments. Branches whose cursor is absent or a literal
/// are left out.
pub fn cursor_bindings(query: &str) -> Result<BTreeMap<String, String>> {
    let document = parse(query)?;
    let mut bindings = BTreeMap::new();

    for op in operations(&document) {
        for branch in top_level_fields(&op) {
            if let Some(variable) = cursor_variable(&branch.field) {
                bindings.insert(branch.response_key, variable);
            }
        }
    }

    Ok(bindings)
}

fn cursor_variable(field: &cst::Field) -> Option<String> {
    let arguments = field.arguments()?;

    let direct = arguments
        .arguments()
        .find(|arg| name_text(arg.name()).as_deref() == Some(CURSOR_ARGUMENT));
    if let Some(arg) = direct {
        return variable_name(arg.value());
    }

    arguments.arguments().find_map(|arg| match arg.value()? {
        cst::Value::ObjectValue(object) => object
            .object_fields()
            .find(|f| name_text(f.name()).as_deref() == Some(CURSOR_ARGUMENT))
            .and_then(|f| variable_name(f.value())),
        _ => None,
    })
}

// ============================================================================
// Ranges
// ============================================================================

/// Byte range of a node, without the trivia the parser attaches after it
pub(crate) fn node_range(node: &impl CstNode) -> Range<usize> {
    let syntax = node.syntax();
    let start: usize = syntax.text_range().start().into();
    let mut token = syntax.last_token();
    while let Some(t) = token {
        let end: usize = t.text_range().end().into();
        if end <= start {
            break;
        }
        if !is_trivia(t.kind()) {
            return start..end;
        }
        token = t.prev_token();
    }
    start..start
}

fn is_trivia(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::WHITESPACE | SyntaxKind::COMMENT | SyntaxKind::COMMA
    )
}

/// Offset just after the last significant token before `close`
pub(crate) fn content_end(close: &SyntaxToken) -> usize {
    let mut token = close.prev_token();
    while let Some(t) = token {
        if !is_trivia(t.kind()) {
            return t.text_range().end().into();
        }
        token = t.prev_token();
    }
    close.text_range().start().into()
}

/// Leading whitespace of the line containing `offset`
pub(crate) fn line_indent(src: &str, offset: usize) -> &str {
    let line_start = src[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &src[line_start..];
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

// ============================================================================
// Edits
// ============================================================================

/// Pending replacements against one source text
#[derive(Debug, Default)]
pub(crate) struct Edits {
    edits: Vec<(Range<usize>, String)>,
}

impl Edits {
    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.edits.push((at..at, text.into()));
    }

    pub fn delete(&mut self, range: Range<usize>) {
        self.edits.push((range, String::new()));
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.push((range, text.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Insert `item` into the comma-separated list closed by `close`
    pub fn append_to_list(&mut self, src: &str, close: &SyntaxToken, item: &str) {
        let at = content_end(close);
        let separator = if src[..at].ends_with(['(', '{']) {
            ""
        } else {
            ", "
        };
        self.insert(at, format!("{separator}{item}"));
    }

    /// Apply all edits
    ///
    /// Insertions at the same offset keep their push order. Overlapping
    /// deletions are merged.
    pub fn apply(self, src: &str) -> String {
        let mut edits = self.edits;
        edits.sort_by_key(|(range, _)| range.start);

        let mut merged: Vec<(Range<usize>, String)> = Vec::with_capacity(edits.len());
        for (range, text) in edits {
            if let Some((last, last_text)) = merged.last_mut() {
                let both_deletions = text.is_empty()
                    && last_text.is_empty()
                    && range.start < range.end
                    && last.start < last.end;
                if both_deletions && range.start <= last.end {
                    last.end = last.end.max(range.end);
                    continue;
                }
            }
            merged.push((range, text));
        }

        let mut out = src.to_string();
        for (range, text) in merged.into_iter().rev() {
            out.replace_range(range, &text);
        }
        out
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;

    #[test]
    fn test_edits_keep_push_order_at_same_offset() {
        let mut edits = Edits::default();
        edits.insert(3, "A");
        edits.insert(3, "B");
        edits.insert(0, ">");
        edits.delete(4..6);
        assert_eq!(edits.apply("abcdefg"), ">abcABdg");
    }

    #[test]
    fn test_edits_merge_overlapping_deletions() {
        let mut edits = Edits::default();
        edits.delete(2..5);
        edits.delete(1..3);
        edits.delete(7..8);
        assert_eq!(edits.apply("abcdefghi"), "afgi");
    }

    #[test]
    fn test_line_indent() {
        let src = "query {\n    a\n}";
        assert_eq!(line_indent(src, src.find('a').unwrap()), "    ");
        assert_eq!(line_indent(src, 0), "");
    }

    #[test]
    fn test_parse_rejects_invalid_document() {
        assert!(matches!(
            parse("query { a(: }"),
            Err(Error::QueryParse { .. })
        ));
    }

    #[test]
    fn test_cursor_bindings() {
        let query = r#"query Q($c: String, $d: String) {
  a: TokenBalances(input: {limit: 1, cursor: $c}) { id }
  Socials(limit: 2, cursor: $d) { id }
  b: TokenBalances(input: {limit: 1, cursor: "literal"}) { id }
  Wallet(input: {identity: $c}) { id }
}"#;
        let bindings = cursor_bindings(query).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings["a"], "c");
        assert_eq!(bindings["Socials"], "d");
    }

    #[test]
    fn test_used_and_declared_variables() {
        let document =
            parse("query Q($a: Int, $b: Int) @cached(ttl: $b) { x(arg: {n: [$a]}) { y } }").unwrap();
        let op = &operations(&document)[0];
        assert_eq!(declared_variables(op), vec!["a", "b"]);
        let used = used_variables(&document, op);
        assert!(used.contains("a"));
        assert!(used.contains("b"));
    }

    #[test]
    fn test_used_variables_follow_fragment_spreads() {
        let document = parse(
            "query Q($a: Int, $b: Int, $c: Int) { x { ...Outer } } \
             fragment Outer on X { y(n: $a) { ...Inner } } \
             fragment Inner on Y @include(if: $b) { z ...Outer } \
             fragment Unused on X { w(n: $c) }",
        )
        .unwrap();
        let op = &operations(&document)[0];
        let used = used_variables(&document, op);
        assert_eq!(used, BTreeSet::from(["a".to_string(), "b".to_string()]));

        let spread = used_fragments(&document);
        assert!(spread.contains("Outer"));
        assert!(spread.contains("Inner"));
        assert!(!spread.contains("Unused"));
    }
}
