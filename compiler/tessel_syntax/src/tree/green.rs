//! Owned parser output.

use std::fmt;
use std::sync::Arc;

use crate::char_table::TokenText;
use crate::kind::TypeHandle;
use crate::span::text_len;

/// One lexer token: a kind and its text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TypeHandle,
    pub text: TokenText,
}

impl Lexeme {
    pub fn new(kind: TypeHandle, text: TokenText) -> Self {
        Lexeme { kind, text }
    }
}

/// A subtree as produced by a parser, before it is placed in a `SyntaxTree`.
///
/// Equality is structural: kinds, texts and shape. The lexeme cache of a
/// chameleon is not part of its identity.
#[derive(Clone)]
pub enum GreenNode {
    Token {
        kind: TypeHandle,
        text: TokenText,
    },
    Node {
        kind: TypeHandle,
        children: Vec<GreenNode>,
    },
    /// Unexpanded lazy subtree holding its raw text.
    Chameleon {
        kind: TypeHandle,
        text: TokenText,
        lexemes: Option<Arc<[Lexeme]>>,
    },
}

impl GreenNode {
    pub fn token(kind: TypeHandle, text: TokenText) -> Self {
        GreenNode::Token { kind, text }
    }

    pub fn node(kind: TypeHandle, children: Vec<GreenNode>) -> Self {
        GreenNode::Node { kind, children }
    }

    pub fn chameleon(kind: TypeHandle, text: TokenText) -> Self {
        GreenNode::Chameleon {
            kind,
            text,
            lexemes: None,
        }
    }

    pub fn kind(&self) -> &TypeHandle {
        match self {
            GreenNode::Token { kind, .. }
            | GreenNode::Node { kind, .. }
            | GreenNode::Chameleon { kind, .. } => kind,
        }
    }

    /// Child nodes; empty for tokens and chameleons.
    pub fn children(&self) -> &[GreenNode] {
        match self {
            GreenNode::Node { children, .. } => children,
            GreenNode::Token { .. } | GreenNode::Chameleon { .. } => &[],
        }
    }

    pub fn is_chameleon(&self) -> bool {
        matches!(self, GreenNode::Chameleon { .. })
    }

    pub fn text_len(&self) -> u32 {
        match self {
            GreenNode::Token { text, .. } | GreenNode::Chameleon { text, .. } => text_len(text),
            GreenNode::Node { children, .. } => children.iter().map(GreenNode::text_len).sum(),
        }
    }

    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.text_len() as usize);
        self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) {
        match self {
            GreenNode::Token { text, .. } | GreenNode::Chameleon { text, .. } => out.push_str(text),
            GreenNode::Node { children, .. } => {
                for child in children {
                    child.write_text(out);
                }
            }
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        match self {
            GreenNode::Token { kind, text } => writeln!(f, "{:indent$}{kind} {text:?}", ""),
            GreenNode::Chameleon { kind, text, .. } => {
                writeln!(f, "{:indent$}{kind} (lazy) {text:?}", "")
            }
            GreenNode::Node { kind, children } => {
                writeln!(f, "{:indent$}{kind}", "")?;
                for child in children {
                    child.fmt_tree(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                GreenNode::Token { kind: k1, text: t1 },
                GreenNode::Token { kind: k2, text: t2 },
            )
            | (
                GreenNode::Chameleon {
                    kind: k1, text: t1, ..
                },
                GreenNode::Chameleon {
                    kind: k2, text: t2, ..
                },
            ) => k1 == k2 && t1 == t2,
            (
                GreenNode::Node {
                    kind: k1,
                    children: c1,
                },
                GreenNode::Node {
                    kind: k2,
                    children: c2,
                },
            ) => k1 == k2 && c1 == c2,
            _ => false,
        }
    }
}

impl Eq for GreenNode {}

/// Indented outline, one node per line.
impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
