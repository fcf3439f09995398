use super::{Facet, FacetFeature, FacetOutput};
use std::fmt::Write;

pub const PROFILE_URL_BASE: &str = "https://bsky.app/profile";
pub const HASHTAG_URL_BASE: &str = "https://bsky.app/hashtag";

/// Writes faceted text back out as markdown links.
pub struct MarkdownFacetOutput<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownFacetOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FacetOutput for MarkdownFacetOutput<W> {
    type Error = std::fmt::Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
        self.writer.write_str(text)
    }

    fn start_feature(&mut self, feature: &FacetFeature) -> Result<(), Self::Error> {
        match feature {
            FacetFeature::Link { .. } | FacetFeature::Mention { .. } | FacetFeature::Tag { .. } => {
                self.writer.write_char('[')
            }
            FacetFeature::Unknown => Ok(()),
        }
    }

    fn end_feature(&mut self, feature: &FacetFeature) -> Result<(), Self::Error> {
        match feature {
            FacetFeature::Link { uri } => write!(self.writer, "]({uri})"),
            FacetFeature::Mention { did } => write!(self.writer, "]({PROFILE_URL_BASE}/{did})"),
            FacetFeature::Tag { tag } => write!(self.writer, "]({HASHTAG_URL_BASE}/{tag})"),
            FacetFeature::Unknown => Ok(()),
        }
    }
}

pub fn render_faceted_markdown(text: &str, facets: &[Facet]) -> Result<String, std::fmt::Error> {
    let mut output = MarkdownFacetOutput::new(String::new());
    super::process_faceted_text(text, facets, &mut output)?;
    Ok(output.into_inner())
}
