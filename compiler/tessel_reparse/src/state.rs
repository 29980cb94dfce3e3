//! Reparse state machine.
//!
//! ```text
//! Stable -> EditPending -> Classifying -+-> LocalReparse -> Stable
//!                |            ^    |    |        |
//!                |            +----+    |        v
//!                +----------------------+--> FullReparse -> Stable
//! ```
//!
//! `Classifying -> Classifying` is the walk up to the next reparseable
//! ancestor. `LocalReparse -> FullReparse` happens only when the splice
//! itself is refused.

use std::fmt;

use tessel_syntax::NodeId;
use tracing::trace;

/// Why an edit was not handled by a local reparse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    /// No reparseable node below the root strictly encloses the edit.
    NoReparseableAncestor,
    /// Every enclosing reparseable node rejected the new text.
    RejectedUpToRoot,
    /// `ReparseConfig::max_ancestor_walk` candidates rejected the new text.
    WalkLimitReached,
    /// The edit does not fit the document or splits a character.
    EditOutOfBounds,
    /// The accepting kind has no content parser.
    NoContentParser { kind: String },
    /// The kind's content parser returned an error.
    ParseFailed(String),
    /// The candidate differs from the target in kind or text length.
    CandidateMismatch(String),
    /// `is_valid_reparse` refused the candidate.
    InvalidReparse { kind: String },
    /// A parser or reparse hook panicked.
    HookPanicked { kind: String },
    /// The tree refused the splice.
    SpliceFailed(String),
}

impl FallbackReason {
    /// Stable short name, used as the statistics key.
    pub fn code(&self) -> &'static str {
        match self {
            FallbackReason::NoReparseableAncestor => "no_reparseable_ancestor",
            FallbackReason::RejectedUpToRoot => "rejected_up_to_root",
            FallbackReason::WalkLimitReached => "walk_limit_reached",
            FallbackReason::EditOutOfBounds => "edit_out_of_bounds",
            FallbackReason::NoContentParser { .. } => "no_content_parser",
            FallbackReason::ParseFailed(_) => "parse_failed",
            FallbackReason::CandidateMismatch(_) => "candidate_mismatch",
            FallbackReason::InvalidReparse { .. } => "invalid_reparse",
            FallbackReason::HookPanicked { .. } => "hook_panicked",
            FallbackReason::SpliceFailed(_) => "splice_failed",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoReparseableAncestor => {
                f.write_str("no reparseable node encloses the edit")
            }
            FallbackReason::RejectedUpToRoot => {
                f.write_str("every enclosing reparseable node rejected the edit")
            }
            FallbackReason::WalkLimitReached => f.write_str("ancestor walk limit reached"),
            FallbackReason::EditOutOfBounds => f.write_str("edit lies outside the document"),
            FallbackReason::NoContentParser { kind } => {
                write!(f, "`{kind}` has no content parser")
            }
            FallbackReason::ParseFailed(message) => write!(f, "local parse failed: {message}"),
            FallbackReason::CandidateMismatch(message) => {
                write!(f, "local parse result rejected: {message}")
            }
            FallbackReason::InvalidReparse { kind } => {
                write!(f, "`{kind}` rejected the reparsed node")
            }
            FallbackReason::HookPanicked { kind } => write!(f, "hook of `{kind}` panicked"),
            FallbackReason::SpliceFailed(message) => write!(f, "splice failed: {message}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReparseState {
    /// Tree and text agree.
    Stable,
    /// Text changed; tree not yet updated.
    EditPending,
    /// Asking `node`'s kind whether the edit can be handled locally.
    Classifying { node: NodeId },
    /// Splicing a locally parsed replacement for `node`.
    LocalReparse { node: NodeId },
    /// Reparsing the whole document.
    FullReparse { reason: FallbackReason },
}

impl ReparseState {
    pub fn can_transition_to(&self, next: &ReparseState) -> bool {
        use ReparseState::{Classifying, EditPending, FullReparse, LocalReparse, Stable};
        matches!(
            (self, next),
            (Stable, EditPending)
                | (EditPending, Classifying { .. } | FullReparse { .. })
                | (
                    Classifying { .. },
                    Classifying { .. } | LocalReparse { .. } | FullReparse { .. }
                )
                | (LocalReparse { .. } | FullReparse { .. }, Stable)
                | (LocalReparse { .. }, FullReparse { .. })
        )
    }
}

/// States visited while handling one edit, starting at `Stable`.
#[derive(Clone, Debug)]
pub(crate) struct StateTrace {
    states: Vec<ReparseState>,
}

impl StateTrace {
    pub(crate) fn new() -> Self {
        StateTrace {
            states: vec![ReparseState::Stable],
        }
    }

    pub(crate) fn advance(&mut self, next: ReparseState) {
        let current = self.current();
        debug_assert!(
            current.can_transition_to(&next),
            "illegal reparse transition {current:?} -> {next:?}"
        );
        trace!(from = ?current, to = ?next, "reparse transition");
        self.states.push(next);
    }

    pub(crate) fn current(&self) -> &ReparseState {
        // Never empty: `new` seeds `Stable`.
        &self.states[self.states.len() - 1]
    }

    pub(crate) fn into_states(self) -> Vec<ReparseState> {
        self.states
    }
}
