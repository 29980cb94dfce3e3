//! Finding the nodes a local reparse may replace.

use tessel_syntax::{NodeId, SyntaxTree, TextEdit};

/// Reparseable nodes that strictly enclose `edit`, innermost first.
///
/// The root is never a candidate: reparsing it is a full reparse.
pub(crate) fn reparse_candidates(tree: &SyntaxTree, edit: &TextEdit) -> Vec<NodeId> {
    let root = tree.root();
    let start = tree.covering_element(edit.range);
    tree.ancestors(start)
        .filter(|&id| id != root)
        .filter(|&id| tree.kind(id).is_some_and(|kind| kind.is_reparseable()))
        .filter(|&id| tree.range(id).is_some_and(|range| edit.is_inside(range)))
        .collect()
}
