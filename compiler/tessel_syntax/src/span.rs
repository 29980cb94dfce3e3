//! Byte ranges into document text.

use std::fmt;

/// Error when creating a span from a range that exceeds `u32::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    #[error("span start {0} (0x{0:X}) exceeds u32::MAX")]
    StartTooLarge(usize),
    #[error("span end {0} (0x{0:X}) exceeds u32::MAX")]
    EndTooLarge(usize),
    #[error("span start {start} is after its end {end}")]
    Inverted { start: usize, end: usize },
}

/// Half-open byte range `[start, end)` in a document.
///
/// Edits may carry an inverted span (`start > end`); tree nodes never do.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Zero-length span at `offset`.
    #[inline]
    pub const fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Checked conversion from a `usize` byte range.
    pub fn try_from_range(range: std::ops::Range<usize>) -> Result<Self, SpanError> {
        let std::ops::Range { start, end } = range;
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        Ok(Span {
            start: u32::try_from(start).map_err(|_| SpanError::StartTooLarge(start))?,
            end: u32::try_from(end).map_err(|_| SpanError::EndTooLarge(end))?,
        })
    }

    /// Like `try_from_range`.
    ///
    /// # Panics
    /// Panics where `try_from_range` fails.
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        Self::try_from_range(range).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Bytes covered; zero for an inverted span.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub const fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// `other` lies entirely within `self`.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Byte length of `text` as a tree offset.
///
/// # Panics
/// Panics on texts longer than `u32::MAX` bytes.
#[inline]
pub(crate) fn text_len(text: &str) -> u32 {
    u32::try_from(text.len()).unwrap_or_else(|_| panic!("{}", SpanError::EndTooLarge(text.len())))
}
