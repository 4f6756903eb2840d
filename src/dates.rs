use crate::models::CalendarDate;
use crate::patterns::PatternLibrary;

/// Earliest date referenced by any citation template in `body`.
///
/// Scans all non-overlapping citation templates, reads the first `date=` or
/// `year=` field of each, and keeps the minimum resolved date. Citations
/// whose field fails to resolve contribute nothing; that is an expected
/// outcome, not an error.
pub fn extract_oldest_date(patterns: &PatternLibrary, body: &str) -> Option<CalendarDate> {
    let mut oldest: Option<CalendarDate> = None;

    for template in patterns.citation.find_iter(body) {
        let Some(caps) = patterns.date_field.captures(template.as_str()) else {
            continue;
        };
        let raw = caps[1].trim();
        if raw.is_empty() {
            continue;
        }
        if let Some(date) = parse_date_string(patterns, raw) {
            if oldest.is_none_or(|current| date < current) {
                oldest = Some(date);
            }
        }
    }

    oldest
}

/// Resolves a raw citation date value like `5 March 2021`, `year=1999` or
/// `Aug 2003` into a calendar date.
///
/// The year is the first 4-digit run; month and day default to 1. The month
/// comes from the first month-table entry found as a substring. The day is
/// the first standalone 1-2 digit number left after removing the year digits.
/// Month/day combinations are not validated against the calendar.
pub fn parse_date_string(patterns: &PatternLibrary, raw: &str) -> Option<CalendarDate> {
    let year_match = patterns.year.find(raw)?;
    let year: i32 = year_match.as_str().parse().ok()?;

    let mut month = 1u32;
    let lower = raw.to_lowercase();
    for (name, number) in patterns.months {
        if lower.contains(name) {
            month = *number;
            break;
        }
    }

    let mut day = 1u32;
    let without_year = raw.replacen(year_match.as_str(), "", 1);
    if let Some(caps) = patterns.day.captures(&without_year) {
        if let Ok(d) = caps[1].parse() {
            day = d;
        }
    }

    Some(CalendarDate { year, month, day })
}
