//! Reparse tuning.

/// Knobs for an `IncrementalReparser`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReparseConfig {
    /// Maximum number of reparseable ancestors tried before falling back.
    pub max_ancestor_walk: usize,
    /// Absorb panics from parser and reparse hooks as a fallback.
    ///
    /// Disable to let hook panics reach the caller (useful when debugging a
    /// language's hooks).
    pub catch_panics: bool,
}

impl Default for ReparseConfig {
    fn default() -> Self {
        ReparseConfig {
            max_ancestor_walk: usize::MAX,
            catch_panics: true,
        }
    }
}
