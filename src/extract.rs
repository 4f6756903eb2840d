use crate::coords::extract_coordinates;
use crate::dates::extract_oldest_date;
use crate::models::{ExtractionResult, RawPage};
use crate::patterns::PatternLibrary;

/// Which extraction results are worth persisting.
///
/// The dataset variants this tool replaces disagreed on the default: one kept
/// only articles with coordinates, the other kept every page. Both behaviors
/// are reachable through this one flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestPolicy {
    pub require_coordinates: bool,
}

/// Applies both heuristics to one page.
///
/// A page without body text yields a result with both fields absent; it still
/// flows downstream so the writer's page accounting stays aligned with the
/// dump order.
///
/// When the policy requires coordinates for persistence, date extraction is
/// skipped entirely for coordinate-less pages. Date parsing is the more
/// expensive scan and its result would be discarded anyway.
pub fn extract_page(
    patterns: &PatternLibrary,
    page: &RawPage,
    policy: IngestPolicy,
) -> ExtractionResult {
    let Some(body) = page.body.as_deref() else {
        return ExtractionResult {
            title: page.title.clone(),
            oldest_date: None,
            coordinates: None,
        };
    };

    let coordinates = extract_coordinates(patterns, body);
    let oldest_date = if policy.require_coordinates && coordinates.is_none() {
        None
    } else {
        extract_oldest_date(patterns, body)
    };

    ExtractionResult {
        title: page.title.clone(),
        oldest_date,
        coordinates,
    }
}
