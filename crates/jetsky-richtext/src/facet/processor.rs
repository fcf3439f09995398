use super::FacetOutput;
use super::types::{Facet, FacetFeature};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct FacetEvent<'a> {
    pos: usize,
    is_start: bool,
    feature: &'a FacetFeature,
    facet_idx: usize,
}

impl PartialEq for FacetEvent<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.is_start == other.is_start
    }
}

impl Eq for FacetEvent<'_> {}

impl PartialOrd for FacetEvent<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FacetEvent<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // at the same position, ends sort before starts
        self.pos
            .cmp(&other.pos)
            .then_with(|| self.is_start.cmp(&other.is_start))
    }
}

/// Walk `text`, calling into `output` for plain runs and for each feature
/// opening and closing.
///
/// Empty ranges, unknown features and ranges that don't land on char
/// boundaries are skipped. Overlapping facets are split so that features
/// always nest.
pub fn process_faceted_text<O: FacetOutput>(
    text: &str,
    facets: &[Facet],
    output: &mut O,
) -> Result<(), O::Error> {
    let mut events: Vec<FacetEvent<'_>> = Vec::new();

    for (facet_idx, facet) in facets.iter().enumerate() {
        let range = facet.index;
        if range.is_empty()
            || range.end() > text.len()
            || !text.is_char_boundary(range.start())
            || !text.is_char_boundary(range.end())
        {
            continue;
        }
        for feature in &facet.features {
            if matches!(feature, FacetFeature::Unknown) {
                continue;
            }
            events.push(FacetEvent {
                pos: range.start(),
                is_start: true,
                feature,
                facet_idx,
            });
            events.push(FacetEvent {
                pos: range.end(),
                is_start: false,
                feature,
                facet_idx,
            });
        }
    }

    events.sort();

    let mut active: Vec<(&FacetFeature, usize)> = Vec::new();
    let mut last_pos = 0;

    for event in events {
        if event.pos > last_pos {
            output.write_text(&text[last_pos..event.pos])?;
            last_pos = event.pos;
        }

        if event.is_start {
            output.start_feature(event.feature)?;
            active.push((event.feature, event.facet_idx));
            continue;
        }

        let Some(close_idx) = active
            .iter()
            .rposition(|(f, idx)| *idx == event.facet_idx && *f == event.feature)
        else {
            continue;
        };

        // close everything above the feature, then reopen what was above it
        let drained: Vec<_> = active.drain(close_idx..).collect();
        for (f, _) in drained.iter().rev() {
            output.end_feature(f)?;
        }
        for (f, idx) in drained.into_iter().skip(1) {
            output.start_feature(f)?;
            active.push((f, idx));
        }
    }

    if last_pos < text.len() {
        output.write_text(&text[last_pos..])?;
    }

    for (feature, _) in active.into_iter().rev() {
        output.end_feature(feature)?;
    }

    Ok(())
}
