//! Per-kind behavior stored alongside capability flags.
//!
//! Capabilities say *what* a kind can do; these traits carry the code that
//! does it. A kind holds at most one of each, set through `KindSpec`.

use std::any::Any;

use super::{Language, TypeHandle};
use crate::char_table::CharTable;
use crate::error::ParseFailure;
use crate::tree::{GreenNode, Lexeme, NodeRef};

/// Input to a content parser: the text of one node of `kind`.
pub struct ParseRequest<'a> {
    /// Entry kind; the returned node must be of this kind.
    pub kind: &'a TypeHandle,
    pub text: &'a str,
    /// Resolved language of the node being parsed.
    pub language: &'a Language,
    pub char_table: &'a CharTable,
    /// Lexemes kept from when the text was collapsed, if the kind asked for it.
    pub cached_lexemes: Option<&'a [Lexeme]>,
}

/// Parser entry point for a lazy-parseable kind.
///
/// Used both to expand a chameleon subtree and to produce the candidate node
/// of a local reparse. Must be deterministic: parsing the same text twice
/// yields structurally equal nodes.
pub trait ContentParser: Send + Sync {
    fn parse_contents(&self, request: &ParseRequest<'_>) -> Result<GreenNode, ParseFailure>;
}

impl<F> ContentParser for F
where
    F: Fn(&ParseRequest<'_>) -> Result<GreenNode, ParseFailure> + Send + Sync,
{
    fn parse_contents(&self, request: &ParseRequest<'_>) -> Result<GreenNode, ParseFailure> {
        self(request)
    }
}

/// Lex-time parse function for `CUSTOM_PARSING` kinds.
///
/// Receives the raw token text and the intern table and returns a node that
/// covers exactly that text.
pub trait CustomParser: Send + Sync {
    fn parse(&self, kind: &TypeHandle, text: &str, char_table: &CharTable) -> GreenNode;
}

impl<F> CustomParser for F
where
    F: Fn(&TypeHandle, &str, &CharTable) -> GreenNode + Send + Sync,
{
    fn parse(&self, kind: &TypeHandle, text: &str, char_table: &CharTable) -> GreenNode {
        self(kind, text, char_table)
    }
}

/// Arguments to `ReparseRules::is_reparseable`.
pub struct ReparseRequest<'a> {
    /// The node whose text changed.
    pub node: NodeRef<'a>,
    /// The node's text with the edit applied.
    pub new_text: &'a str,
    pub file_language: &'a Language,
    /// The node's parent, for languages where validity depends on the
    /// enclosing construct (indentation).
    pub parent: Option<NodeRef<'a>>,
    /// Caller-provided resolution context (project, module graph).
    pub context: &'a dyn Any,
}

/// Incremental reparse hooks for a `REPARSEABLE` kind.
pub trait ReparseRules: Send + Sync {
    /// Can `request.new_text` be parsed in isolation as a node of this kind?
    fn is_reparseable(&self, request: &ReparseRequest<'_>) -> bool;

    /// Structural sanity check on the candidate produced by a local parse.
    fn is_valid_reparse(&self, old: NodeRef<'_>, new: &GreenNode) -> bool {
        let _ = (old, new);
        true
    }

    /// Hint that tokens collapsed into this kind's span may be cached for a
    /// later reparse. Caching policy belongs to the caller.
    fn reuse_collapsed_tokens(&self) -> bool {
        false
    }
}
