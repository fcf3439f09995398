use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::ops::Range;

/// Byte offsets into the UTF-8 encoding of the post text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRange {
    pub byte_start: usize,
    pub byte_end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            byte_start: start,
            byte_end: end,
        }
    }

    pub fn to_range(self) -> Range<usize> {
        self.byte_start..self.byte_end
    }

    pub fn is_empty(&self) -> bool {
        self.byte_start >= self.byte_end
    }

    pub fn start(&self) -> usize {
        self.byte_start
    }

    pub fn end(&self) -> usize {
        self.byte_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum FacetFeature {
    #[serde(rename = "app.bsky.richtext.facet#link")]
    Link { uri: SmolStr },
    #[serde(rename = "app.bsky.richtext.facet#mention")]
    Mention { did: SmolStr },
    /// Only read back from timelines, never produced.
    #[serde(rename = "app.bsky.richtext.facet#tag")]
    Tag { tag: SmolStr },
    /// Feature types we don't know about. Renderers skip these.
    #[serde(other, skip_serializing)]
    Unknown,
}

/// A rich text annotation over a byte range of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub index: ByteRange,
    pub features: Vec<FacetFeature>,
}

impl Facet {
    pub fn link(index: ByteRange, uri: impl Into<SmolStr>) -> Self {
        Self {
            index,
            features: vec![FacetFeature::Link { uri: uri.into() }],
        }
    }

    pub fn mention(index: ByteRange, did: impl Into<SmolStr>) -> Self {
        Self {
            index,
            features: vec![FacetFeature::Mention { did: did.into() }],
        }
    }
}
