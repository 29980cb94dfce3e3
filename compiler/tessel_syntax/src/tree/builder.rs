//! Event-driven construction of `GreenNode`s.
//!
//! Parsers drive a `TreeBuilder` with `start_node` / `token` / `finish_node`.
//! The builder decides where trivia goes and how each token is
//! materialized, so parsers never deal with either.
//!
//! # Trivia binding
//!
//! Trivia (the builder's trivia `TokenSet`) never starts or ends a node:
//! - a run before `start_node` is placed in front of the new node;
//! - a run before `finish_node` is left outside the finished node.
//!
//! The root node is the exception and covers all text, including leading
//! and trailing trivia.
//!
//! An empty node (no children) sits on one side of the surrounding trivia
//! run: before it when its kind is left-bound, after it otherwise. This is
//! decided by the kind alone, so the same input always yields the same
//! tree. An empty node always stays inside the node that was open when it
//! finished; if it is that node's last child, it goes after the last
//! non-trivia child and the trailing trivia stays outside.

use std::mem;
use std::sync::Arc;

use tracing::trace;

use super::green::{GreenNode, Lexeme};
use crate::char_table::CharTable;
use crate::error::TreeError;
use crate::kind::TypeHandle;
use crate::token_set::TokenSet;

struct Frame {
    kind: TypeHandle,
    /// Trivia and deferred empty nodes seen right before `start_node`.
    leading: Vec<GreenNode>,
    children: Vec<GreenNode>,
    /// Empty non-left-bound children waiting for the trivia run to end.
    deferred: Vec<GreenNode>,
}

/// Builds one `GreenNode` from parser events.
pub struct TreeBuilder<'a> {
    char_table: &'a CharTable,
    trivia: TokenSet,
    stack: Vec<Frame>,
    /// Trivia not yet attached to any node.
    pending_trivia: Vec<GreenNode>,
    /// The root frame's deferred empty nodes, placed after trailing trivia.
    trailing_empty: Vec<GreenNode>,
    root: Option<GreenNode>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(char_table: &'a CharTable, trivia: TokenSet) -> Self {
        TreeBuilder {
            char_table,
            trivia,
            stack: Vec::new(),
            pending_trivia: Vec::new(),
            trailing_empty: Vec::new(),
            root: None,
        }
    }

    pub fn char_table(&self) -> &'a CharTable {
        self.char_table
    }

    /// Open a node of `kind`.
    pub fn start_node(&mut self, kind: TypeHandle) {
        let mut leading = mem::take(&mut self.pending_trivia);
        if let Some(parent) = self.stack.last_mut() {
            leading.append(&mut parent.deferred);
        }
        self.stack.push(Frame {
            kind,
            leading,
            children: Vec::new(),
            deferred: Vec::new(),
        });
    }

    /// Add a token of `kind` covering `text`.
    ///
    /// Trivia is buffered. Other tokens are materialized by capability:
    /// custom-parsing kinds through their custom parse function,
    /// lazy-parseable kinds as chameleons, everything else as a leaf.
    pub fn token(&mut self, kind: &TypeHandle, text: &str) -> Result<(), TreeError> {
        if self.trivia.contains(kind) {
            let text = self.char_table.intern(text);
            self.pending_trivia
                .push(GreenNode::token(kind.clone(), text));
            return Ok(());
        }
        let element = self.create_leaf(kind, text);
        self.push_child(element)
    }

    fn create_leaf(&self, kind: &TypeHandle, text: &str) -> GreenNode {
        if kind.is_custom_parsing() {
            if let Some(parser) = kind.custom_parser() {
                return parser.parse(kind, text, self.char_table);
            }
        }
        let text = self.char_table.intern(text);
        if kind.is_lazy_parseable() {
            return GreenNode::chameleon(kind.clone(), text);
        }
        GreenNode::token(kind.clone(), text)
    }

    /// Collapse a run of lexemes into one element of `kind`.
    ///
    /// Lazy-parseable kinds become a chameleon; the lexemes are kept on it
    /// when the kind's `reuse_collapsed_tokens` hint is set. Other kinds
    /// become a single leaf.
    pub fn collapse(&mut self, kind: &TypeHandle, lexemes: &[Lexeme]) -> Result<(), TreeError> {
        let joined: String = lexemes.iter().map(|lexeme| &*lexeme.text).collect();
        let text = self.char_table.intern(&joined);
        let element = if kind.is_lazy_parseable() {
            GreenNode::Chameleon {
                kind: kind.clone(),
                text,
                lexemes: kind
                    .reuse_collapsed_tokens()
                    .then(|| Arc::from(lexemes)),
            }
        } else {
            GreenNode::token(kind.clone(), text)
        };
        self.push_child(element)
    }

    /// Add a subtree built elsewhere (a nested parse, a cached node).
    pub fn subtree(&mut self, node: GreenNode) -> Result<(), TreeError> {
        self.push_child(node)
    }

    fn push_child(&mut self, element: GreenNode) -> Result<(), TreeError> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(TreeError::Unbalanced("token outside of any node"));
        };
        frame.children.append(&mut self.pending_trivia);
        frame.children.append(&mut frame.deferred);
        frame.children.push(element);
        Ok(())
    }

    /// Close the innermost open node.
    pub fn finish_node(&mut self) -> Result<(), TreeError> {
        let Some(frame) = self.stack.pop() else {
            return Err(TreeError::Unbalanced("finish_node without start_node"));
        };
        let Frame {
            kind,
            mut leading,
            mut children,
            deferred,
        } = frame;

        let Some(parent) = self.stack.last_mut() else {
            if self.root.is_some() {
                return Err(TreeError::Unbalanced("more than one root node"));
            }
            leading.append(&mut children);
            self.root = Some(GreenNode::node(kind, leading));
            self.trailing_empty = deferred;
            return Ok(());
        };
        children.extend(deferred);

        if !children.is_empty() {
            parent.children.append(&mut leading);
            parent.children.push(GreenNode::node(kind, children));
        } else if kind.is_left_bound() {
            trace!(kind = %kind, "empty node bound left");
            parent.children.push(GreenNode::node(kind, children));
            parent.children.append(&mut leading);
        } else {
            parent.children.append(&mut leading);
            parent.deferred.push(GreenNode::node(kind, children));
        }
        Ok(())
    }

    /// Finish building and return the root.
    ///
    /// Trivia after the root's `finish_node` becomes the root's last children.
    pub fn finish(mut self) -> Result<GreenNode, TreeError> {
        if !self.stack.is_empty() {
            return Err(TreeError::Unbalanced("unclosed node at finish"));
        }
        match self.root.take() {
            Some(GreenNode::Node { kind, mut children }) => {
                children.append(&mut self.pending_trivia);
                children.append(&mut self.trailing_empty);
                Ok(GreenNode::Node { kind, children })
            }
            Some(other) => Ok(other),
            None => Err(TreeError::Unbalanced("no root node")),
        }
    }
}
