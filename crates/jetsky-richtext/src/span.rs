//! Spans located by the extractors.
//!
//! All offsets are in Unicode scalar values (chars), not bytes. They index the
//! rewritten text produced by [`crate::extract_links`], never the raw input.
//! Conversion to the byte offsets used on the wire happens in
//! [`crate::facet::ByteOffsets`].

use smol_str::SmolStr;
use std::ops::Range;

/// Half-open char range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn to_range(self) -> Range<usize> {
        self.start..self.end
    }

    /// True if both spans share at least one char.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice `text` by this char range. Returns None if the range is out of bounds.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.start > self.end {
            return None;
        }
        let mut indices = text.char_indices().map(|(i, _)| i).chain(Some(text.len()));
        let start = indices.nth(self.start)?;
        let end = if self.is_empty() {
            start
        } else {
            indices.nth(self.len() - 1)?
        };
        text.get(start..end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A markdown link label and the URL it pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub span: Span,
    /// Taken verbatim from the `(url)` part of the markup.
    pub url: SmolStr,
}

/// An `@handle` token. The span covers the sigil, `handle` does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSpan {
    pub span: Span,
    pub handle: SmolStr,
}
