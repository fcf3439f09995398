use ropey::Rope;

use super::types::{ByteRange, Facet};
use crate::resolve::HandleResolutions;
use crate::span::{LinkSpan, MentionSpan, Span};

/// Char → byte offset conversion for one text.
///
/// The extractors report char offsets; facets on the wire need byte offsets
/// into the UTF-8 text. Any multi-byte char before a span pushes its byte
/// offsets past its char offsets.
pub struct ByteOffsets {
    rope: Rope,
}

impl ByteOffsets {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Byte offset of `char_offset`. Offsets past the end clamp to the text length.
    pub fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope
            .char_to_byte(char_offset.min(self.rope.len_chars()))
    }

    pub fn byte_range(&self, span: Span) -> ByteRange {
        ByteRange::new(self.char_to_byte(span.start), self.char_to_byte(span.end))
    }
}

/// Build the facet list for `text` from both extraction phases.
///
/// Every link becomes a link facet. A mention becomes a mention facet only if
/// its handle resolved; unresolved mentions stay in the text as plain words.
/// Mentions sitting inside a link label are left to the link.
pub fn assemble(
    text: &str,
    links: &[LinkSpan],
    mentions: &[MentionSpan],
    resolutions: &HandleResolutions,
) -> Vec<Facet> {
    let offsets = ByteOffsets::new(text);
    let mut facets = Vec::with_capacity(links.len() + mentions.len());

    for link in links {
        facets.push(Facet::link(offsets.byte_range(link.span), link.url.clone()));
    }

    for mention in mentions {
        let Some(did) = resolutions.get(&mention.handle) else {
            tracing::debug!(handle = %mention.handle, "dropping unresolved mention");
            continue;
        };
        if links.iter().any(|l| l.span.overlaps(&mention.span)) {
            tracing::debug!(handle = %mention.handle, "mention inside link label, skipping");
            continue;
        }
        facets.push(Facet::mention(offsets.byte_range(mention.span), did.clone()));
    }

    facets
}
