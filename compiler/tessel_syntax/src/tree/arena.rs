//! Arena-backed syntax tree with stable node ids.
//!
//! Nodes live in one `Vec` and refer to each other by `NodeId`. Nodes are
//! never removed: `splice` detaches the replaced subtree and appends the new
//! one, so every id that was valid before a splice and lies outside the
//! replaced subtree still names the same node afterwards.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::green::{GreenNode, Lexeme};
use super::node_ref::NodeRef;
use crate::char_table::{CharTable, TokenText};
use crate::error::TreeError;
use crate::kind::{Language, ParseRequest, TypeHandle};
use crate::span::Span;

/// Index of a node in its `SyntaxTree`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

pub(crate) enum Body {
    Token(TokenText),
    Composite(Vec<NodeId>),
    Chameleon {
        text: TokenText,
        lexemes: Option<Arc<[Lexeme]>>,
    },
    /// Removed from the tree by a splice.
    Detached,
}

pub(crate) struct NodeData {
    pub(crate) kind: TypeHandle,
    pub(crate) parent: Option<NodeId>,
    pub(crate) len: u32,
    pub(crate) body: Body,
}

/// A document's syntax tree.
///
/// The tree performs no locking. Edits against one tree must be serialized
/// by the caller.
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
    language: Language,
}

impl SyntaxTree {
    /// Materialize `green` as a new tree for a file of `language`.
    pub fn from_green(green: &GreenNode, language: Language) -> Self {
        let mut tree = SyntaxTree {
            nodes: Vec::new(),
            root: NodeId(0),
            language,
        };
        tree.root = tree.alloc(green, None);
        tree
    }

    fn alloc(&mut self, green: &GreenNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let (body, children) = match green {
            GreenNode::Token { text, .. } => (Body::Token(Arc::clone(text)), &[][..]),
            GreenNode::Chameleon { text, lexemes, .. } => (
                Body::Chameleon {
                    text: Arc::clone(text),
                    lexemes: lexemes.clone(),
                },
                &[][..],
            ),
            GreenNode::Node { children, .. } => (Body::Composite(Vec::new()), children.as_slice()),
        };
        self.nodes.push(NodeData {
            kind: green.kind().clone(),
            parent,
            len: green.text_len(),
            body,
        });
        let child_ids: Vec<NodeId> = children
            .iter()
            .map(|child| self.alloc(child, Some(id)))
            .collect();
        if let Body::Composite(slot) = &mut self.nodes[id.index()].body {
            *slot = child_ids;
        }
        id
    }

    /// Nodes are never removed, so any id handed out by this tree is valid.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn attached(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.index())
            .filter(|data| !matches!(data.body, Body::Detached))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_ref(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    /// Language of the file this tree was parsed from.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Length of the whole document.
    pub fn text_len(&self) -> u32 {
        self.nodes[self.root.index()].len
    }

    pub fn is_detached(&self, id: NodeId) -> bool {
        self.attached(id).is_none()
    }

    pub fn node_ref(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.attached(id).map(|_| NodeRef::new(self, id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&TypeHandle> {
        self.attached(id).map(|data| &data.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.attached(id).and_then(|data| data.parent)
    }

    /// Child ids; empty for leaves, chameleons and detached nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.index()).map(|data| &data.body) {
            Some(Body::Composite(children)) => children,
            _ => &[],
        }
    }

    /// `id` and then each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.attached(id).map(|_| id), move |&id| self.parent(id))
    }

    pub fn is_chameleon(&self, id: NodeId) -> bool {
        matches!(
            self.attached(id).map(|data| &data.body),
            Some(Body::Chameleon { .. })
        )
    }

    /// Document offset of an attached node.
    pub(crate) fn offset(&self, id: NodeId) -> u32 {
        let mut offset = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current.index()].parent {
            offset += self
                .children(parent)
                .iter()
                .take_while(|&&sibling| sibling != current)
                .map(|sibling| self.nodes[sibling.index()].len)
                .sum::<u32>();
            current = parent;
        }
        offset
    }

    /// Document range of `id`, or `None` if it is detached.
    pub fn range(&self, id: NodeId) -> Option<Span> {
        let data = self.attached(id)?;
        let start = self.offset(id);
        Some(Span::new(start, start + data.len))
    }

    /// Text covered by `id`, or `None` if it is detached.
    pub fn text(&self, id: NodeId) -> Option<String> {
        let data = self.attached(id)?;
        let mut out = String::with_capacity(data.len as usize);
        self.write_text(id, &mut out);
        Some(out)
    }

    /// The whole document text.
    pub fn full_text(&self) -> String {
        self.text(self.root).unwrap_or_default()
    }

    pub(crate) fn write_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.index()].body {
            Body::Token(text) | Body::Chameleon { text, .. } => out.push_str(text),
            Body::Composite(children) => {
                for &child in children {
                    self.write_text(child, out);
                }
            }
            Body::Detached => {}
        }
    }

    /// Deepest node whose range contains `span`.
    pub fn covering_element(&self, span: Span) -> NodeId {
        let mut current = self.root;
        let mut start = 0u32;
        'descend: loop {
            let mut child_start = start;
            for &child in self.children(current) {
                let len = self.nodes[child.index()].len;
                if Span::new(child_start, child_start + len).contains_span(span) {
                    current = child;
                    start = child_start;
                    continue 'descend;
                }
                child_start += len;
            }
            return current;
        }
    }

    /// Rebuild the green form of `id`.
    pub fn to_green(&self, id: NodeId) -> Option<GreenNode> {
        let data = self.attached(id)?;
        let kind = data.kind.clone();
        Some(match &data.body {
            Body::Token(text) => GreenNode::Token {
                kind,
                text: Arc::clone(text),
            },
            Body::Chameleon { text, lexemes } => GreenNode::Chameleon {
                kind,
                text: Arc::clone(text),
                lexemes: lexemes.clone(),
            },
            Body::Composite(children) => GreenNode::Node {
                kind,
                children: children
                    .iter()
                    .filter_map(|&child| self.to_green(child))
                    .collect(),
            },
            Body::Detached => return None,
        })
    }

    /// Language a node's content is parsed in: the node kind's own language,
    /// or the file language for universal kinds.
    pub fn resolved_language(&self, id: NodeId) -> Option<&Language> {
        self.kind(id)
            .map(|kind| kind.resolved_language(&self.language))
    }

    /// Replace the subtree at `id` with `green`.
    ///
    /// Ancestor lengths are adjusted; every node outside the replaced
    /// subtree keeps its id. The old subtree is detached. Returns the id of
    /// the new subtree root.
    pub fn splice(&mut self, id: NodeId, green: &GreenNode) -> Result<NodeId, TreeError> {
        let old_len = self.attached(id).ok_or(TreeError::DetachedNode(id))?.len;
        let parent = self.nodes[id.index()].parent;

        let new_id = self.alloc(green, parent);
        match parent {
            None => self.root = new_id,
            Some(parent) => {
                if let Body::Composite(children) = &mut self.nodes[parent.index()].body {
                    if let Some(slot) = children.iter_mut().find(|child| **child == id) {
                        *slot = new_id;
                    }
                }
                let new_len = self.nodes[new_id.index()].len;
                let mut ancestor = Some(parent);
                while let Some(current) = ancestor {
                    let data = &mut self.nodes[current.index()];
                    data.len = data.len - old_len + new_len;
                    ancestor = data.parent;
                }
            }
        }
        self.detach(id);
        trace!(old = ?id, new = ?new_id, "spliced subtree");
        Ok(new_id)
    }

    fn detach(&mut self, id: NodeId) {
        let data = &mut self.nodes[id.index()];
        data.parent = None;
        let body = std::mem::replace(&mut data.body, Body::Detached);
        if let Body::Composite(children) = body {
            for child in children {
                self.detach(child);
            }
        }
    }

    /// Parse the deferred content of chameleon `id` in place.
    ///
    /// The node keeps its id; its children are appended to the arena.
    /// Expanding an already expanded node does nothing.
    ///
    /// # Errors
    /// Fails if the node is detached, its kind has no content parser, the
    /// parser fails, or the result differs in kind or text length.
    pub fn expand(&mut self, id: NodeId, char_table: &CharTable) -> Result<(), TreeError> {
        let data = self.attached(id).ok_or(TreeError::DetachedNode(id))?;
        let Body::Chameleon { text, lexemes } = &data.body else {
            return Ok(());
        };
        let (kind, len) = (data.kind.clone(), data.len);
        let Some(parser) = kind.content_parser() else {
            return Err(TreeError::NotExpandable {
                id,
                kind: kind.debug_name().to_owned(),
            });
        };
        let request = ParseRequest {
            kind: &kind,
            text,
            language: kind.resolved_language(&self.language),
            char_table,
            cached_lexemes: lexemes.as_deref(),
        };
        let green = parser.parse_contents(&request)?;
        check_parse_result(&kind, len, &green)?;

        let body = match &green {
            GreenNode::Token { text, .. } => Body::Token(Arc::clone(text)),
            GreenNode::Chameleon { text, lexemes, .. } => Body::Chameleon {
                text: Arc::clone(text),
                lexemes: lexemes.clone(),
            },
            GreenNode::Node { children, .. } => {
                let ids = children
                    .iter()
                    .map(|child| self.alloc(child, Some(id)))
                    .collect();
                Body::Composite(ids)
            }
        };
        self.nodes[id.index()].body = body;
        trace!(?id, kind = %kind, "expanded chameleon");
        Ok(())
    }

    /// Expand every chameleon in the tree, including ones that appear while
    /// expanding.
    pub fn expand_all(&mut self, char_table: &CharTable) -> Result<(), TreeError> {
        let mut work = vec![self.root];
        while let Some(id) = work.pop() {
            if self.is_chameleon(id) {
                self.expand(id, char_table)?;
            }
            work.extend(self.children(id).iter().rev());
        }
        Ok(())
    }
}

/// Check that a parser result is of the entry `kind` and covers
/// `expected_len` bytes.
pub fn check_parse_result(
    kind: &TypeHandle,
    expected_len: u32,
    green: &GreenNode,
) -> Result<(), TreeError> {
    if green.kind() != kind {
        return Err(TreeError::KindMismatch {
            expected: kind.debug_name().to_owned(),
            actual: green.kind().debug_name().to_owned(),
        });
    }
    let actual = green.text_len();
    if actual != expected_len {
        return Err(TreeError::TextMismatch {
            kind: kind.debug_name().to_owned(),
            expected: expected_len as usize,
            actual: actual as usize,
        });
    }
    Ok(())
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_green(self.root) {
            Some(green) => write!(f, "{green:?}"),
            None => f.write_str("<empty>"),
        }
    }
}
