use crate::config::TITLE_MAX_CHARS;
use serde::{Serialize, Serializer};
use std::fmt;

/// A calendar date as resolved by the date heuristic.
///
/// Ordering is lexicographic on `(year, month, day)`. Month and day are only
/// range-checked by the patterns that produce them; impossible combinations
/// like Feb 30 are kept as-is rather than silently corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One `<page>` element as reconstructed by the dump reader.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub title: String,
    /// Latest revision's text, or `None` if the page carries no revision text
    pub body: Option<String>,
}

/// What the extractor derived from a single page.
///
/// Coordinates are `(lon, lat)` -- map-axis order, inverted relative to the
/// latitude-first argument order of the `{{Coord}}` template itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub title: String,
    pub oldest_date: Option<CalendarDate>,
    pub coordinates: Option<(f64, f64)>,
}

/// The record shape accepted by a storage sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub oldest_date: Option<CalendarDate>,
    pub coordinates: Option<(f64, f64)>,
}

impl ArticleRecord {
    /// Builds a persistable record, truncating the title to the sink's
    /// bounded length.
    pub fn from_result(result: ExtractionResult) -> Self {
        let title = if result.title.chars().count() > TITLE_MAX_CHARS {
            result.title.chars().take(TITLE_MAX_CHARS).collect()
        } else {
            result.title
        };
        Self {
            title,
            oldest_date: result.oldest_date,
            coordinates: result.coordinates,
        }
    }
}
