//! Tessel Reparse - Incremental Reparse Decisions
//!
//! Decides, per text edit, whether a syntax tree can be updated by
//! reparsing one subtree or must be reparsed from scratch, and applies the
//! decision.
//!
//! # Key Types
//!
//! - [`IncrementalReparser`] - Classifies and applies edits, keeps statistics
//! - [`Classification`] - Local replacement candidate or fallback reason
//! - [`ReparseState`] - States an edit moves through
//! - [`FallbackReason`] - Why an edit needed a full reparse
//!
//! A local reparse is an optimization only: for every edit it accepts, the
//! resulting tree equals what a full reparse of the edited text produces.
//! Any doubt (a refusing hook, a failing parser, a panic) falls back to the
//! full reparse.

mod config;
mod context;
mod driver;
mod error;
mod locate;
mod state;
mod stats;

pub use config::ReparseConfig;
pub use context::ReparseContext;
pub use driver::{full_reparse, Classification, IncrementalReparser, ReparseOutcome, ReparsePath};
pub use error::ReparseError;
pub use state::{FallbackReason, ReparseState};
pub use stats::ReparseStats;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
