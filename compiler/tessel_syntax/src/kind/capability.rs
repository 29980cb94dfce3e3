//! Capability flags carried by every kind.

use bitflags::bitflags;

bitflags! {
    /// How a tree builder materializes nodes of a kind.
    ///
    /// `FILE_ROOT` and `REPARSEABLE` imply `LAZY_PARSEABLE`. `LEAF` and
    /// `COMPOSITE` are mutually exclusive; a kind with neither gets the
    /// default node representation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u8 {
        /// Terminal nodes built directly from lexer text.
        const LEAF = 1 << 0;
        /// Internal nodes whose children come from the parser.
        const COMPOSITE = 1 << 1;
        /// The single top-level kind of a parsed unit.
        const FILE_ROOT = 1 << 2;
        /// Subtree parsing is deferred until first inspection.
        const LAZY_PARSEABLE = 1 << 3;
        /// Supports local incremental reparse.
        const REPARSEABLE = 1 << 4;
        /// Parsed eagerly at lex time by a kind-specific function.
        const CUSTOM_PARSING = 1 << 5;
    }
}

impl Capabilities {
    /// Apply the implication rules.
    ///
    /// Returns `None` when `LEAF` and `COMPOSITE` are both set.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        if self.contains(Self::LEAF | Self::COMPOSITE) {
            return None;
        }
        if self.intersects(Self::FILE_ROOT | Self::REPARSEABLE) {
            return Some(self | Self::LAZY_PARSEABLE);
        }
        Some(self)
    }
}
