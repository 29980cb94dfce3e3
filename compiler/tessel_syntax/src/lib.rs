//! Tessel Syntax - Kind Registry and Tree Primitives
//!
//! This crate contains the identity layer underneath Tessel's syntax trees:
//! - Kinds (`TypeHandle`) with their capability flags and per-kind behavior
//! - The process-wide `TypeRegistry` assigning every kind a dense index
//! - `TokenSet` for O(1) kind classification with open/predicate variants
//! - `CharTable` for interning token text
//! - A small tree arena (`SyntaxTree`) and `TreeBuilder` used by parsers
//!
//! # Design Philosophy
//!
//! - **Index Everything**: kinds are compared and classified by `KindIndex`,
//!   never by name
//! - **Never Reuse**: registry slots are append-only; unloading an extension
//!   leaves tombstones behind
//! - **Capabilities, Not Hierarchies**: per-kind dispatch goes through
//!   `Capabilities` plus optional behavior objects stored on the kind
//!
//! Kind indices are process-local. They are rebuilt on every start and must
//! not be persisted; persist debug names or language-qualified names instead.

mod char_table;
mod common;
mod edit;
mod error;
pub mod kind;
pub mod registry;
mod span;
pub mod token_set;
pub mod tree;

pub use char_table::{CharTable, TokenText};
pub use common::CommonKinds;
pub use edit::TextEdit;
pub use error::{KindError, ParseFailure, TreeError};
pub use kind::{
    Capabilities, ContentParser, CustomParser, KindIndex, KindSpec, Language, OwnerId,
    ParseRequest, ReparseRequest, ReparseRules, TypeHandle,
};
pub use registry::{OverflowReport, OverflowSink, RegistryConfig, Tombstone, TypeRegistry};
pub use span::{Span, SpanError};
pub use token_set::TokenSet;
pub use tree::{GreenNode, Lexeme, NodeId, NodeRef, SyntaxTree, TreeBuilder};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=tessel_syntax=debug` or `RUST_LOG=tessel_reparse=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
