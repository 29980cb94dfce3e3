use std::fmt;

use super::arena::{NodeData, NodeId, SyntaxTree};
use super::green::GreenNode;
use crate::kind::{Language, TypeHandle};
use crate::span::Span;

/// Borrowed view of one attached node.
#[derive(Copy, Clone)]
pub struct NodeRef<'a> {
    tree: &'a SyntaxTree,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// Caller guarantees `id` is attached to `tree`.
    pub(crate) fn new(tree: &'a SyntaxTree, id: NodeId) -> Self {
        NodeRef { tree, id }
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> &'a TypeHandle {
        &self.data().kind
    }

    pub fn range(self) -> Span {
        let start = self.tree.offset(self.id);
        Span::new(start, start + self.data().len)
    }

    pub fn text(self) -> String {
        let mut out = String::with_capacity(self.data().len as usize);
        self.tree.write_text(self.id, &mut out);
        out
    }

    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.data()
            .parent
            .map(|parent| NodeRef::new(self.tree, parent))
    }

    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |&child| NodeRef::new(tree, child))
    }

    pub fn is_chameleon(self) -> bool {
        self.tree.is_chameleon(self.id)
    }

    pub fn resolved_language(self) -> &'a Language {
        self.kind().resolved_language(self.tree.language())
    }

    pub fn to_green(self) -> Option<GreenNode> {
        self.tree.to_green(self.id)
    }

    fn data(self) -> &'a NodeData {
        self.tree.node(self.id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.kind(), self.range())
    }
}
