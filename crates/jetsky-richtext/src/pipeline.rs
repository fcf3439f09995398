use std::time::Duration;

use crate::facet::{Facet, assemble};
use crate::links::extract_links;
use crate::mentions::{extract_mentions, unique_handles};
use crate::resolve::{HandleLookup, resolve_handles};

/// Post text with markup stripped and the facets that index it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPost {
    pub text: String,
    pub facets: Vec<Facet>,
}

/// Turn raw markdown-ish text into post text plus facets.
///
/// Links are rewritten first, mentions are found in the rewritten text, their
/// handles are resolved through `lookup`, and the facets are built against the
/// rewritten text.
pub async fn prepare_post<L: HandleLookup>(
    text: &str,
    lookup: &L,
    timeout: Duration,
) -> PreparedPost {
    let links = extract_links(text);
    let mentions = extract_mentions(&links.rewritten);

    let resolutions = resolve_handles(unique_handles(&mentions), lookup, timeout).await;
    let facets = assemble(&links.rewritten, &links.spans, &mentions, &resolutions);

    tracing::debug!(
        links = links.spans.len(),
        mentions = mentions.len(),
        facets = facets.len(),
        "prepared post"
    );

    PreparedPost {
        text: links.rewritten,
        facets,
    }
}
