//! Rich text facets for Bluesky posts.
//!
//! Takes markdown-ish text, strips `[label](url)` link markup, finds `@handle`
//! mentions, resolves the handles to DIDs and produces the
//! `app.bsky.richtext.facet` list indexing the final text by byte offset.

pub mod error;
pub mod facet;
pub mod links;
pub mod mentions;
pub mod pipeline;
pub mod resolve;
pub mod span;

pub use error::ResolveError;
pub use facet::{ByteRange, Facet, FacetFeature, assemble, render_faceted_markdown};
pub use links::{LinkExtraction, extract_links};
pub use mentions::{extract_mentions, unique_handles};
pub use pipeline::{PreparedPost, prepare_post};
pub use resolve::{
    DEFAULT_RESOLVE_TIMEOUT, Did, HandleLookup, HandleResolutions, XrpcHandleLookup,
    resolve_handles, resolve_handles_at,
};
pub use span::{LinkSpan, MentionSpan, Span};
