//! `@handle` detection.
//!
//! A handle is a dotted domain name: labels of 1-63 alphanumerics with inner
//! hyphens, the last label starting with a letter. The `@` has to sit at the
//! start of the text or after a non-word character, so `email@foo.com` is not
//! a mention.

use regex::Regex;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::span::{MentionSpan, Span};

pub static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@(?P<handle>(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)",
    )
    .unwrap()
});

/// ASCII word characters only: any non-ASCII char before `@` is a boundary,
/// so `日本@alice.bsky.social` still mentions alice.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Find every `@handle` token in `text`.
///
/// Run this on the output of [`crate::extract_links`] so URLs inside link
/// markup are already gone.
pub fn extract_mentions(text: &str) -> Vec<MentionSpan> {
    let mut spans = Vec::new();
    // (byte offset, char offset) of the last converted position
    let mut cursor = (0usize, 0usize);

    for caps in MENTION_RE.captures_iter(text) {
        let (Some(whole), Some(handle)) = (caps.get(0), caps.name("handle")) else {
            continue;
        };

        // no lookbehind in the regex crate, so the boundary is checked here
        if text[..whole.start()]
            .chars()
            .next_back()
            .is_some_and(is_word_char)
        {
            continue;
        }

        let start = cursor.1 + text[cursor.0..whole.start()].chars().count();
        let end = start + whole.as_str().chars().count();
        cursor = (whole.end(), end);

        spans.push(MentionSpan {
            span: Span::new(start, end),
            handle: SmolStr::new(handle.as_str()),
        });
    }

    spans
}

/// Distinct handles referenced by `spans`, in sorted order.
pub fn unique_handles(spans: &[MentionSpan]) -> BTreeSet<SmolStr> {
    spans.iter().map(|m| m.handle.clone()).collect()
}
