use rustc_hash::FxHashMap;

use crate::state::FallbackReason;

/// Counters over the edits handled by one `IncrementalReparser`.
#[derive(Clone, Debug, Default)]
pub struct ReparseStats {
    /// Edits handled by splicing one subtree.
    pub local_count: usize,
    /// Edits that reparsed the whole document.
    pub full_count: usize,
    /// Full reparses per `FallbackReason::code`.
    pub fallbacks: FxHashMap<&'static str, usize>,
}

impl ReparseStats {
    pub(crate) fn record_local(&mut self) {
        self.local_count += 1;
    }

    pub(crate) fn record_full(&mut self, reason: &FallbackReason) {
        self.full_count += 1;
        *self.fallbacks.entry(reason.code()).or_default() += 1;
    }

    /// Full reparses caused by `reason`'s code.
    pub fn fallbacks_for(&self, reason: &FallbackReason) -> usize {
        self.fallbacks.get(reason.code()).copied().unwrap_or(0)
    }

    /// Share of edits handled locally, as a percentage.
    #[allow(
        clippy::cast_precision_loss,
        reason = "counts won't approach 2^52; precision loss irrelevant for display"
    )]
    pub fn reuse_rate(&self) -> f64 {
        let total = self.local_count + self.full_count;
        if total == 0 {
            0.0
        } else {
            (self.local_count as f64 / total as f64) * 100.0
        }
    }
}
