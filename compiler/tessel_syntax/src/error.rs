//! Error types for the kind registry, token sets and syntax trees.

use crate::kind::{Capabilities, OwnerId};
use crate::tree::NodeId;
use std::borrow::Cow;

/// Errors raised by the kind registry and kind-set construction.
///
/// `IndexOutOfRange` and `Unregistered` point at caller bugs and should be
/// propagated. `UnloadedReference` is recoverable: the referenced kind
/// belonged to an extension that has since been unloaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KindError {
    /// Lookup with an index outside `[0, count)`.
    #[error("kind index {index} is out of range (registry holds {count} kinds)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Lookup of a slot whose owner was unloaded.
    #[error("kind #{index} (`{debug_name}`) was unloaded with owner `{owner}`")]
    UnloadedReference {
        index: usize,
        debug_name: Cow<'static, str>,
        owner: OwnerId,
    },

    /// The 15-bit index space is used up.
    #[error("kind registry exhausted: no indices left below {limit}")]
    Exhausted { limit: usize },

    /// Leaf and Composite were requested together, or custom parsing was
    /// requested without a custom parser.
    #[error("kind `{name}` has invalid capabilities {capabilities:?}")]
    InvalidCapabilities {
        name: Cow<'static, str>,
        capabilities: Capabilities,
    },

    /// An unregistered handle was used where a registered one is required.
    #[error("kind `{name}` is not registered")]
    Unregistered { name: Cow<'static, str> },
}

/// Failure reported by a content parser or custom parse function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ParseFailure {
    /// Debug name of the entry kind that failed to parse.
    pub kind: String,
    pub message: String,
}

impl ParseFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ParseFailure {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Misuse of the tree arena or builder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node {0:?} is detached or does not exist")]
    DetachedNode(NodeId),

    #[error("node {id:?} of kind `{kind}` cannot be expanded")]
    NotExpandable { id: NodeId, kind: String },

    #[error("parse of `{kind}` produced {actual} bytes of text, expected {expected}")]
    TextMismatch {
        kind: String,
        expected: usize,
        actual: usize,
    },

    #[error("parse of `{expected}` produced a `{actual}` node")]
    KindMismatch { expected: String, actual: String },

    #[error("tree builder is unbalanced: {0}")]
    Unbalanced(&'static str),

    #[error(transparent)]
    Parse(#[from] ParseFailure),
}
