//! Text edits against a document.

use crate::span::{text_len, Span};

/// A single replacement of `range` in the old text with `new_text`.
///
/// Maps directly to an LSP `TextDocumentContentChangeEvent` with a range.
///
/// # Examples
///
/// ```
/// use tessel_syntax::{Span, TextEdit};
///
/// let edit = TextEdit::replace(Span::new(4, 7), "quux");
/// assert_eq!(edit.delta(), 1);
/// assert_eq!(edit.apply("foo bar baz").as_deref(), Some("foo quux baz"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TextEdit {
    /// Replaced region in the old text.
    pub range: Span,
    /// Replacement text.
    pub new_text: String,
}

impl TextEdit {
    pub fn replace(range: Span, new_text: impl Into<String>) -> Self {
        TextEdit {
            range,
            new_text: new_text.into(),
        }
    }

    /// Create an insertion (no characters removed).
    pub fn insert(at: u32, text: impl Into<String>) -> Self {
        Self::replace(Span::point(at), text)
    }

    /// Create a deletion (no characters inserted).
    pub fn delete(range: Span) -> Self {
        Self::replace(range, String::new())
    }

    /// Net change in document length (positive = grew, negative = shrank).
    pub fn delta(&self) -> i64 {
        i64::from(text_len(&self.new_text)) - i64::from(self.range.len())
    }

    /// End of the inserted text in the new document.
    pub fn new_end(&self) -> u32 {
        self.range.start + text_len(&self.new_text)
    }

    /// Check if this edit is confined to the interior of `node`.
    ///
    /// Replacements and deletions may touch the node's edges. A pure insertion
    /// exactly at an edge lands between two nodes and belongs to neither.
    pub fn is_inside(&self, node: Span) -> bool {
        if !node.contains_span(self.range) {
            return false;
        }
        if self.range.is_empty() {
            return node.start < self.range.start && self.range.start < node.end;
        }
        true
    }

    /// Apply the edit to the full old text.
    ///
    /// Returns `None` if the range is inverted, falls outside `text` or
    /// splits a character.
    pub fn apply(&self, text: &str) -> Option<String> {
        self.apply_within(text, 0)
    }

    /// Apply the edit to the text of a node that starts at `node_start`.
    ///
    /// Returns `None` if the edit does not fall within `node_text`.
    pub fn apply_within(&self, node_text: &str, node_start: u32) -> Option<String> {
        if self.range.is_inverted() {
            return None;
        }
        let start = self.range.start.checked_sub(node_start)? as usize;
        let end = self.range.end.checked_sub(node_start)? as usize;
        if end > node_text.len()
            || !node_text.is_char_boundary(start)
            || !node_text.is_char_boundary(end)
        {
            return None;
        }
        let mut out = String::with_capacity(node_text.len() + self.new_text.len() - (end - start));
        out.push_str(&node_text[..start]);
        out.push_str(&self.new_text);
        out.push_str(&node_text[end..]);
        Some(out)
    }
}
