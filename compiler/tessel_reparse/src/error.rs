//! Errors of the full reparse path.
//!
//! Local reparse never fails outward: every problem there becomes a
//! `FallbackReason`. Only the full reparse can fail, and when it does the
//! tree is left exactly as it was.

use tessel_syntax::{ParseFailure, Span, TreeError};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReparseError {
    #[error("edit {range} lies outside the document (length {len})")]
    EditOutOfBounds { range: Span, len: u32 },

    #[error("root kind `{kind}` has no content parser")]
    NoRootParser { kind: String },

    #[error("full reparse failed: {0}")]
    Parse(#[from] ParseFailure),

    #[error("full reparse produced an invalid tree: {0}")]
    Tree(#[from] TreeError),
}
