//! Syntax trees.
//!
//! # Key Types
//!
//! - [`GreenNode`] - Owned parser output; compared structurally
//! - [`TreeBuilder`] - Turns parser events into a `GreenNode`
//! - [`SyntaxTree`] - Arena holding a document's tree, addressed by [`NodeId`]
//! - [`NodeRef`] - Borrowed view of one node
//!
//! Lazy-parseable kinds enter the tree as chameleons: raw text whose parse
//! is deferred until `SyntaxTree::expand`. Local reparses replace exactly
//! one subtree with `SyntaxTree::splice`.

mod arena;
mod builder;
mod green;
mod node_ref;

pub use arena::{check_parse_result, NodeId, SyntaxTree};
pub use builder::TreeBuilder;
pub use green::{GreenNode, Lexeme};
pub use node_ref::NodeRef;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
