//! Markdown link extraction.
//!
//! `[label](url)` markup is stripped down to `label`, and the label's position
//! is recorded against the text as it is rebuilt. Removing markup shortens the
//! text, so offsets taken from the input would drift for every later link.

use regex::Regex;
use smol_str::SmolStr;
use std::sync::LazyLock;

use crate::span::{LinkSpan, Span};

pub static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?P<label>[^\]]*)\]\((?P<url>[^)]+)\)").unwrap());

/// Output of [`extract_links`]. Every span indexes `rewritten`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkExtraction {
    pub spans: Vec<LinkSpan>,
    pub rewritten: String,
}

/// Strip `[label](url)` markup from `text`, keeping the labels in place.
///
/// Matches are taken left to right without overlap. Anything that doesn't
/// match the pattern passes through untouched.
pub fn extract_links(text: &str) -> LinkExtraction {
    let mut rewritten = String::with_capacity(text.len());
    let mut spans = Vec::new();
    // char length of `rewritten`, kept alongside to avoid rescanning it
    let mut out_chars = 0usize;
    let mut last_end = 0usize;

    for caps in MARKDOWN_LINK_RE.captures_iter(text) {
        let (Some(whole), Some(label), Some(url)) =
            (caps.get(0), caps.name("label"), caps.name("url"))
        else {
            continue;
        };

        let before = &text[last_end..whole.start()];
        rewritten.push_str(before);
        out_chars += before.chars().count();

        let start = out_chars;
        rewritten.push_str(label.as_str());
        out_chars += label.as_str().chars().count();

        spans.push(LinkSpan {
            span: Span::new(start, out_chars),
            url: SmolStr::new(url.as_str()),
        });
        last_end = whole.end();
    }

    rewritten.push_str(&text[last_end..]);

    LinkExtraction { spans, rewritten }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(extraction: &LinkExtraction) -> Vec<&str> {
        extraction
            .spans
            .iter()
            .map(|l| l.span.slice(&extraction.rewritten).unwrap())
            .collect()
    }

    #[test]
    fn test_no_links_is_identity() {
        let text = "nothing to see (here) [or] here";
        let out = extract_links(text);
        assert_eq!(out.rewritten, text);
        assert!(out.spans.is_empty());
    }

    #[test]
    fn test_two_links() {
        let out = extract_links("see [here](http://a) and [there](http://b) now");
        assert_eq!(out.rewritten, "see here and there now");
        assert_eq!(out.spans.len(), 2);
        assert_eq!(out.spans[0].span, Span::new(4, 8));
        assert_eq!(out.spans[0].url, "http://a");
        assert_eq!(out.spans[1].span, Span::new(13, 18));
        assert_eq!(out.spans[1].url, "http://b");
        assert_eq!(labels(&out), vec!["here", "there"]);
    }

    #[test]
    fn test_adjacent_links() {
        let out = extract_links("[a](http://a)[bc](http://b)");
        assert_eq!(out.rewritten, "abc");
        assert_eq!(out.spans[0].span, Span::new(0, 1));
        assert_eq!(out.spans[1].span, Span::new(1, 3));
    }

    #[test]
    fn test_empty_label_gives_empty_span() {
        let out = extract_links("x []( url) y");
        assert_eq!(out.rewritten, "x  y");
        assert_eq!(out.spans.len(), 1);
        assert_eq!(out.spans[0].span, Span::new(2, 2));
        assert_eq!(out.spans[0].url, " url");
    }

    #[test]
    fn test_unicode_labels_use_char_offsets() {
        let out = extract_links("日本 [東京](https://tokyo.example) 🌍 [café](https://cafe.example)");
        assert_eq!(out.rewritten, "日本 東京 🌍 café");
        assert_eq!(out.spans[0].span, Span::new(3, 5));
        assert_eq!(out.spans[1].span, Span::new(8, 12));
        assert_eq!(labels(&out), vec!["東京", "café"]);
    }

    #[test]
    fn test_url_is_kept_verbatim() {
        let out = extract_links("[docs](https://example.com/a?b=c#d)");
        assert_eq!(out.spans[0].url, "https://example.com/a?b=c#d");
    }

    #[test]
    fn test_unclosed_markup_passes_through() {
        let text = "[broken](http://a and [ok](http://b)";
        let out = extract_links(text);
        // the first url runs up to the first ')', swallowing the second label
        assert_eq!(out.spans.len(), 1);
        assert_eq!(out.rewritten, "broken");
        assert_eq!(out.spans[0].url, "http://a and [ok](http://b");
    }

    #[test]
    fn test_bracket_inside_label_run() {
        // a label may not contain ']', so matching restarts at the inner '['
        let out = extract_links("[a] [b](http://b)");
        assert_eq!(out.rewritten, "[a] b");
        assert_eq!(out.spans[0].span, Span::new(4, 5));
    }
}
