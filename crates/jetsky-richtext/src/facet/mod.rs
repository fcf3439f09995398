mod assemble;
mod markdown_output;
mod processor;
mod types;

pub use assemble::{ByteOffsets, assemble};
pub use markdown_output::{
    HASHTAG_URL_BASE, MarkdownFacetOutput, PROFILE_URL_BASE, render_faceted_markdown,
};
pub use processor::process_faceted_text;
pub use types::{ByteRange, Facet, FacetFeature};

pub trait FacetOutput {
    type Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn start_feature(&mut self, feature: &FacetFeature) -> Result<(), Self::Error>;
    fn end_feature(&mut self, feature: &FacetFeature) -> Result<(), Self::Error>;
}
