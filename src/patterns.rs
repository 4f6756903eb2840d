use once_cell::sync::Lazy;
use regex::Regex;

/// Month lookup in match priority order: abbreviated names first, then full
/// names. The heuristic takes the first table entry found as a substring, so
/// this order is itself a tie-break and must stay stable.
pub const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Compiled text patterns shared read-only by every extraction worker.
///
/// Template boundaries are matched by regex, not by brace counting, so nested
/// `{{ }}` pairs inside a citation can cut a match short. That is an accepted
/// heuristic; swapping in a stricter brace-balanced scanner only touches this
/// module.
pub struct PatternLibrary {
    /// A `{{Cite ...}}` or `{{Citation ...}}` template up to its closing braces
    pub citation: Regex,
    /// `|date=` or `|year=` field inside a citation, value captured up to `|` or `}`
    pub date_field: Regex,
    /// First 4-digit run in a date value
    pub year: Regex,
    /// Standalone 1-2 digit day number in 1..=31
    pub day: Regex,
    /// `{{Coord|...}}` with the pipe-delimited argument list captured
    pub coord: Regex,
    pub months: &'static [(&'static str, u32)],
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self {
            citation: Regex::new(r"(?i)\{\{\s*(?:Cite|Citation)[^}]*\}\}").unwrap(),
            date_field: Regex::new(r"(?i)\|\s*(?:date|year)\s*=\s*([^|}]*)").unwrap(),
            year: Regex::new(r"\d{4}").unwrap(),
            day: Regex::new(r"\b([1-9]|[12][0-9]|3[01])\b").unwrap(),
            coord: Regex::new(r"(?i)\{\{Coord\s*\|(.*?)\}\}").unwrap(),
            months: MONTHS,
        }
    }

    /// Process-wide shared instance; immutable after initialization.
    pub fn shared() -> &'static PatternLibrary {
        static SHARED: Lazy<PatternLibrary> = Lazy::new(PatternLibrary::new);
        &SHARED
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citation_matches_cite_and_citation() {
        let p = PatternLibrary::new();
        assert!(p.citation.is_match("{{Cite web|url=http://a.b}}"));
        assert!(p.citation.is_match("{{citation|title=X}}"));
        assert!(p.citation.is_match("{{ Cite book |year=1999}}"));
        assert!(!p.citation.is_match("{{reflist}}"));
    }

    #[test]
    fn citation_spans_newlines() {
        let p = PatternLibrary::new();
        let text = "{{Cite web\n| url = http://a.b\n| date = 2001\n}}";
        assert!(p.citation.is_match(text));
    }

    #[test]
    fn date_field_captures_value() {
        let p = PatternLibrary::new();
        let caps = p.date_field.captures("{{Cite web|date=5 March 2021|url=x}}").unwrap();
        assert_eq!(caps[1].trim(), "5 March 2021");
    }

    #[test]
    fn date_field_first_match_wins() {
        let p = PatternLibrary::new();
        let caps = p.date_field.captures("{{Cite web|year=1999|date=2005}}").unwrap();
        assert_eq!(caps[1].trim(), "1999");
    }

    #[test]
    fn day_rejects_out_of_range() {
        let p = PatternLibrary::new();
        assert!(p.day.find("32").is_none());
        assert!(p.day.find("0").is_none());
        assert_eq!(p.day.find("31").unwrap().as_str(), "31");
        assert_eq!(p.day.find("7").unwrap().as_str(), "7");
    }

    #[test]
    fn day_requires_word_boundary() {
        let p = PatternLibrary::new();
        // Digits embedded in longer runs are not standalone day numbers
        assert!(p.day.find("1234").is_none());
    }

    #[test]
    fn coord_captures_argument_list() {
        let p = PatternLibrary::new();
        let caps = p.coord.captures("before {{Coord|44.112|-87.913|display=title}} after").unwrap();
        assert_eq!(&caps[1], "44.112|-87.913|display=title");
    }

    #[test]
    fn coord_is_non_greedy() {
        let p = PatternLibrary::new();
        let caps = p.coord.captures("{{Coord|1|2}} tail {{Coord|3|4}}").unwrap();
        assert_eq!(&caps[1], "1|2");
    }

    #[test]
    fn month_table_prefers_earlier_entries() {
        // "may" appears once; abbreviation entries win before full names
        let idx_mar = MONTHS.iter().position(|(n, _)| *n == "mar").unwrap();
        let idx_march = MONTHS.iter().position(|(n, _)| *n == "march").unwrap();
        assert!(idx_mar < idx_march);
    }
}
