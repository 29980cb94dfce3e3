//! Edit handling: classify, then splice locally or reparse everything.
//!
//! # Protocol
//!
//! 1. Find the reparseable nodes that strictly enclose the edit, innermost
//!    first (the root excluded). None: full reparse.
//! 2. Ask each candidate's `ReparseRules::is_reparseable` with its new text
//!    and its parent. A refusal moves on to the next enclosing candidate.
//! 3. Parse the accepted node's new text with its kind's content parser.
//!    An unexpanded chameleon is replaced with a new chameleon instead and
//!    stays unparsed.
//! 4. `ReparseRules::is_valid_reparse` checks the candidate. A refusal is a
//!    full reparse; the walk does not resume.
//! 5. Splice the candidate in place of the old node.
//!
//! Errors and panics in steps 2-4 become a full reparse. The tree is only
//! mutated in step 5 or by the full reparse, never partially.

use std::panic::{self, AssertUnwindSafe};

use tessel_syntax::tree::check_parse_result;
use tessel_syntax::{
    GreenNode, NodeId, NodeRef, ParseRequest, ReparseRequest, SyntaxTree, TextEdit, TypeHandle,
};
use tracing::debug;

use crate::config::ReparseConfig;
use crate::context::ReparseContext;
use crate::error::ReparseError;
use crate::locate::reparse_candidates;
use crate::state::{FallbackReason, ReparseState, StateTrace};
use crate::stats::ReparseStats;

/// Result of classifying one edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Replace `target` with `candidate`.
    Local {
        target: NodeId,
        candidate: GreenNode,
        /// Candidates asked before one accepted (1 = innermost).
        attempts: usize,
    },
    Full(FallbackReason),
}

/// How an edit was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReparsePath {
    /// `replaced` was detached and `inserted` put in its place.
    Local { replaced: NodeId, inserted: NodeId },
    /// The whole tree was rebuilt.
    Full(FallbackReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReparseOutcome {
    pub path: ReparsePath,
    /// States visited, from `Stable` back to `Stable`.
    pub trace: Vec<ReparseState>,
}

impl ReparseOutcome {
    pub fn is_local(&self) -> bool {
        matches!(self.path, ReparsePath::Local { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.path {
            ReparsePath::Full(reason) => Some(reason),
            ReparsePath::Local { .. } => None,
        }
    }
}

/// Applies edits to syntax trees, locally where the kinds allow it.
///
/// Holds no tree state; one reparser may serve many documents. Edits to one
/// tree must not run concurrently.
#[derive(Debug, Default)]
pub struct IncrementalReparser {
    config: ReparseConfig,
    stats: ReparseStats,
}

impl IncrementalReparser {
    pub fn new(config: ReparseConfig) -> Self {
        IncrementalReparser {
            config,
            stats: ReparseStats::default(),
        }
    }

    pub fn config(&self) -> &ReparseConfig {
        &self.config
    }

    pub fn stats(&self) -> &ReparseStats {
        &self.stats
    }

    /// Decide how `edit` would be applied to `tree`, without changing it.
    pub fn classify(
        &self,
        tree: &SyntaxTree,
        edit: &TextEdit,
        ctx: &ReparseContext<'_>,
    ) -> Classification {
        let mut trace = StateTrace::new();
        self.classify_traced(tree, edit, ctx, &mut trace)
    }

    fn classify_traced(
        &self,
        tree: &SyntaxTree,
        edit: &TextEdit,
        ctx: &ReparseContext<'_>,
        trace: &mut StateTrace,
    ) -> Classification {
        trace.advance(ReparseState::EditPending);
        if edit.range.is_inverted() || edit.range.end > tree.text_len() {
            return Classification::Full(FallbackReason::EditOutOfBounds);
        }

        let candidates = reparse_candidates(tree, edit);
        if candidates.is_empty() {
            return Classification::Full(FallbackReason::NoReparseableAncestor);
        }
        let walk_limited = candidates.len() > self.config.max_ancestor_walk;

        for (attempt, &target) in candidates
            .iter()
            .take(self.config.max_ancestor_walk)
            .enumerate()
        {
            trace.advance(ReparseState::Classifying { node: target });
            let Some(node) = tree.node_ref(target) else {
                continue;
            };
            match self.try_candidate(tree, node, edit, ctx) {
                Ok(Some(candidate)) => {
                    return Classification::Local {
                        target,
                        candidate,
                        attempts: attempt + 1,
                    };
                }
                Ok(None) => {
                    debug!(node = ?target, kind = %node.kind(), "edit rejected, walking up");
                }
                Err(reason) => return Classification::Full(reason),
            }
        }

        Classification::Full(if walk_limited {
            FallbackReason::WalkLimitReached
        } else {
            FallbackReason::RejectedUpToRoot
        })
    }

    /// `Ok(None)`: the node declined and the walk continues.
    fn try_candidate(
        &self,
        tree: &SyntaxTree,
        node: NodeRef<'_>,
        edit: &TextEdit,
        ctx: &ReparseContext<'_>,
    ) -> Result<Option<GreenNode>, FallbackReason> {
        let kind = node.kind();
        let Some(rules) = kind.reparse_rules() else {
            return Ok(None);
        };
        let range = node.range();
        let new_text = edit
            .apply_within(&node.text(), range.start)
            .ok_or(FallbackReason::EditOutOfBounds)?;

        let request = ReparseRequest {
            node,
            new_text: &new_text,
            file_language: tree.language(),
            parent: node.parent(),
            context: ctx.resolve,
        };
        if !self.guard(kind, || rules.is_reparseable(&request))? {
            return Ok(None);
        }

        let candidate = if node.is_chameleon() {
            GreenNode::chameleon(kind.clone(), ctx.char_table.intern(&new_text))
        } else {
            self.parse_candidate(kind, node, &new_text, ctx)?
        };
        let new_len = u32::try_from(new_text.len()).map_err(|_| FallbackReason::EditOutOfBounds)?;
        check_parse_result(kind, new_len, &candidate)
            .map_err(|err| FallbackReason::CandidateMismatch(err.to_string()))?;

        if !self.guard(kind, || rules.is_valid_reparse(node, &candidate))? {
            return Err(FallbackReason::InvalidReparse {
                kind: kind.debug_name().to_owned(),
            });
        }
        Ok(Some(candidate))
    }

    fn parse_candidate(
        &self,
        kind: &TypeHandle,
        node: NodeRef<'_>,
        new_text: &str,
        ctx: &ReparseContext<'_>,
    ) -> Result<GreenNode, FallbackReason> {
        let Some(parser) = kind.content_parser() else {
            return Err(FallbackReason::NoContentParser {
                kind: kind.debug_name().to_owned(),
            });
        };
        let request = ParseRequest {
            kind,
            text: new_text,
            language: node.resolved_language(),
            char_table: ctx.char_table,
            cached_lexemes: None,
        };
        self.guard(kind, || parser.parse_contents(&request))?
            .map_err(|failure| FallbackReason::ParseFailed(failure.to_string()))
    }

    /// Run a language hook, turning a panic into a fallback when configured.
    fn guard<T>(&self, kind: &TypeHandle, hook: impl FnOnce() -> T) -> Result<T, FallbackReason> {
        if !self.config.catch_panics {
            return Ok(hook());
        }
        panic::catch_unwind(AssertUnwindSafe(hook)).map_err(|_| FallbackReason::HookPanicked {
            kind: kind.debug_name().to_owned(),
        })
    }

    /// Apply `edit` to `tree`.
    ///
    /// On `Err` the tree is unchanged: only the full reparse can fail, and it
    /// builds the new tree before replacing the old one.
    pub fn reparse(
        &mut self,
        tree: &mut SyntaxTree,
        edit: &TextEdit,
        ctx: &ReparseContext<'_>,
    ) -> Result<ReparseOutcome, ReparseError> {
        let mut trace = StateTrace::new();
        let reason = match self.classify_traced(tree, edit, ctx, &mut trace) {
            Classification::Local {
                target,
                candidate,
                attempts,
            } => {
                trace.advance(ReparseState::LocalReparse { node: target });
                match tree.splice(target, &candidate) {
                    Ok(inserted) => {
                        trace.advance(ReparseState::Stable);
                        self.stats.record_local();
                        debug!(node = ?target, ?inserted, attempts, "local reparse");
                        return Ok(ReparseOutcome {
                            path: ReparsePath::Local {
                                replaced: target,
                                inserted,
                            },
                            trace: trace.into_states(),
                        });
                    }
                    Err(err) => FallbackReason::SpliceFailed(err.to_string()),
                }
            }
            Classification::Full(reason) => reason,
        };

        trace.advance(ReparseState::FullReparse {
            reason: reason.clone(),
        });
        let rebuilt = full_reparse(tree, edit, ctx)?;
        *tree = rebuilt;
        trace.advance(ReparseState::Stable);
        self.stats.record_full(&reason);
        debug!(%reason, "full reparse");
        Ok(ReparseOutcome {
            path: ReparsePath::Full(reason),
            trace: trace.into_states(),
        })
    }
}

/// Parse the edited document from scratch with the root kind's parser.
pub fn full_reparse(
    tree: &SyntaxTree,
    edit: &TextEdit,
    ctx: &ReparseContext<'_>,
) -> Result<SyntaxTree, ReparseError> {
    let text = edit
        .apply(&tree.full_text())
        .ok_or(ReparseError::EditOutOfBounds {
            range: edit.range,
            len: tree.text_len(),
        })?;
    let root = tree.root_ref();
    let kind = root.kind();
    let parser = kind.content_parser().ok_or_else(|| ReparseError::NoRootParser {
        kind: kind.debug_name().to_owned(),
    })?;
    let green = parser.parse_contents(&ParseRequest {
        kind,
        text: &text,
        language: tree.language(),
        char_table: ctx.char_table,
        cached_lexemes: None,
    })?;
    let len = u32::try_from(text.len()).map_err(|_| ReparseError::EditOutOfBounds {
        range: edit.range,
        len: tree.text_len(),
    })?;
    check_parse_result(kind, len, &green)?;
    Ok(SyntaxTree::from_green(&green, tree.language().clone()))
}
