//! Natural-language date parsing.
//!
//! Queries mention dates in organizer shorthand ("Dec 15", "15th December"),
//! ISO or slash formats, ranges ("Dec 15-20", "December 15 to 20"), and
//! relative phrases ("tomorrow", "next Friday", "this weekend", "in 3
//! days"). Everything resolves against an explicit reference date so the
//! pipeline stays deterministic; yearless month/day phrases resolve into the
//! configured season year. The Margazhi season spans December into January,
//! so a January phrase lands in the year after the season year.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::DateSpan;

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})\s*(?:-|–|\bto\b)\s*(\d{1,2})\b").unwrap());
static MONTH_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b").unwrap());
static DAY_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]{3,9})\b").unwrap());
static ISO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static IN_DAYS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bin\s+(\d+)\s+days?\b").unwrap());

const MONTHS: [(&str, u32); 12] = [
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
];

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(abbrev, _)| lower.starts_with(abbrev))
        .map(|(_, number)| *number)
}

/// Year a yearless month/day phrase resolves into. January belongs to the
/// tail of the season.
fn season_date(season_year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let year = if month == 1 { season_year + 1 } else { season_year };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse any supported date expression out of free text.
///
/// Single days come back as one-day spans. Returns `None` when the text
/// mentions no recognizable date.
pub fn parse_date_phrase(
    text: &str,
    reference: NaiveDate,
    season_year: i32,
) -> Option<DateSpan> {
    if let Some(span) = parse_range(text, season_year) {
        return Some(span);
    }
    if let Some(span) = parse_relative(text, reference) {
        return Some(span);
    }
    parse_explicit(text, season_year).map(DateSpan::single)
}

/// "Dec 15-20", "December 15 to 20".
fn parse_range(text: &str, season_year: i32) -> Option<DateSpan> {
    let captures = RANGE_RE.captures(text)?;
    let month = month_number(&captures[1])?;
    let start_day: u32 = captures[2].parse().ok()?;
    let end_day: u32 = captures[3].parse().ok()?;
    let start = season_date(season_year, month, start_day)?;
    let end = season_date(season_year, month, end_day)?;
    Some(DateSpan::new(start, end))
}

fn parse_relative(text: &str, reference: NaiveDate) -> Option<DateSpan> {
    let lower = text.to_lowercase();

    if lower.contains("today") {
        return Some(DateSpan::single(reference));
    }
    if lower.contains("tomorrow") {
        return Some(DateSpan::single(reference + Duration::days(1)));
    }
    if lower.contains("yesterday") {
        return Some(DateSpan::single(reference - Duration::days(1)));
    }
    if let Some(captures) = IN_DAYS_RE.captures(&lower) {
        let days: i64 = captures[1].parse().ok()?;
        return Some(DateSpan::single(reference + Duration::days(days)));
    }
    // "weekend" before "next week": "next weekend" contains both.
    if lower.contains("weekend") {
        let anchor = if lower.contains("next") {
            reference + Duration::days(7)
        } else {
            reference
        };
        let (saturday, sunday) = weekend_of(anchor);
        return Some(DateSpan::new(saturday, sunday));
    }
    if lower.contains("next week") {
        let monday = next_monday(reference);
        return Some(DateSpan::new(monday, monday + Duration::days(6)));
    }
    for (name, weekday) in WEEKDAYS {
        if lower.contains(name) {
            let day = if lower.contains("next") {
                next_weekday(reference, weekday)
            } else {
                // "this Friday" or a bare weekday: the coming occurrence,
                // today included.
                let ahead = days_ahead(reference.weekday(), weekday);
                reference + Duration::days(ahead)
            };
            return Some(DateSpan::single(day));
        }
    }
    None
}

fn parse_explicit(text: &str, season_year: i32) -> Option<NaiveDate> {
    if let Some(captures) = ISO_RE.captures(text) {
        let year: i32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        let day: u32 = captures[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(captures) = MONTH_DAY_RE.captures(text) {
        if let Some(month) = month_number(&captures[1]) {
            let day: u32 = captures[2].parse().ok()?;
            if let Some(date) = season_date(season_year, month, day) {
                return Some(date);
            }
        }
    }
    if let Some(captures) = DAY_MONTH_RE.captures(text) {
        if let Some(month) = month_number(&captures[2]) {
            let day: u32 = captures[1].parse().ok()?;
            if let Some(date) = season_date(season_year, month, day) {
                return Some(date);
            }
        }
    }
    if let Some(captures) = SLASH_RE.captures(text) {
        let first: u32 = captures[1].parse().ok()?;
        let second: u32 = captures[2].parse().ok()?;
        let year: i32 = captures[3].parse().ok()?;
        // MM/DD first, DD/MM when the first component cannot be a month.
        return NaiveDate::from_ymd_opt(year, first, second)
            .or_else(|| NaiveDate::from_ymd_opt(year, second, first));
    }
    None
}

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

fn days_ahead(from: Weekday, to: Weekday) -> i64 {
    let diff = to.num_days_from_monday() as i64 - from.num_days_from_monday() as i64;
    if diff < 0 {
        diff + 7
    } else {
        diff
    }
}

/// Next occurrence strictly after the reference day.
fn next_weekday(reference: NaiveDate, target: Weekday) -> NaiveDate {
    let mut ahead = days_ahead(reference.weekday(), target);
    if ahead == 0 {
        ahead = 7;
    }
    reference + Duration::days(ahead)
}

fn next_monday(reference: NaiveDate) -> NaiveDate {
    next_weekday(reference, Weekday::Mon)
}

/// Saturday and Sunday of the weekend at or after the anchor day.
fn weekend_of(anchor: NaiveDate) -> (NaiveDate, NaiveDate) {
    let saturday = if anchor.weekday() == Weekday::Sat {
        anchor
    } else if anchor.weekday() == Weekday::Sun {
        // The running weekend started yesterday.
        anchor - Duration::days(1)
    } else {
        next_weekday(anchor, Weekday::Sat)
    };
    (saturday, saturday + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // A Monday in the middle of the season.
    const SEASON_YEAR: i32 = 2025;
    fn reference() -> NaiveDate {
        date(2025, 12, 15)
    }

    #[test]
    fn test_month_day_forms() {
        for text in ["Dec 18", "December 18", "18 December", "18th Dec", "18 of December"] {
            assert_eq!(
                parse_date_phrase(text, reference(), SEASON_YEAR),
                Some(DateSpan::single(date(2025, 12, 18))),
                "failed for {text:?}"
            );
        }
    }

    #[test]
    fn test_january_lands_in_the_following_year() {
        assert_eq!(
            parse_date_phrase("Jan 2", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2026, 1, 2)))
        );
    }

    #[test]
    fn test_iso_and_slash_forms() {
        assert_eq!(
            parse_date_phrase("2025-12-20", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 20)))
        );
        assert_eq!(
            parse_date_phrase("12/20/2025", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 20)))
        );
        // First component cannot be a month: read as DD/MM.
        assert_eq!(
            parse_date_phrase("20/12/2025", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 20)))
        );
    }

    #[test]
    fn test_ranges() {
        let expected = Some(DateSpan::new(date(2025, 12, 15), date(2025, 12, 20)));
        assert_eq!(parse_date_phrase("Dec 15-20", reference(), SEASON_YEAR), expected);
        assert_eq!(
            parse_date_phrase("December 15 to 20", reference(), SEASON_YEAR),
            expected
        );
    }

    #[test]
    fn test_relative_days() {
        assert_eq!(
            parse_date_phrase("today", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 15)))
        );
        assert_eq!(
            parse_date_phrase("tomorrow evening", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 16)))
        );
        assert_eq!(
            parse_date_phrase("in 3 days", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 18)))
        );
    }

    #[test]
    fn test_next_week_is_a_span() {
        // Reference is a Monday; next week runs Mon 22 .. Sun 28.
        assert_eq!(
            parse_date_phrase("next week", reference(), SEASON_YEAR),
            Some(DateSpan::new(date(2025, 12, 22), date(2025, 12, 28)))
        );
    }

    #[test]
    fn test_weekends() {
        assert_eq!(
            parse_date_phrase("this weekend", reference(), SEASON_YEAR),
            Some(DateSpan::new(date(2025, 12, 20), date(2025, 12, 21)))
        );
        assert_eq!(
            parse_date_phrase("next weekend", reference(), SEASON_YEAR),
            Some(DateSpan::new(date(2025, 12, 27), date(2025, 12, 28)))
        );
        // From a Sunday the running weekend is still "this weekend".
        assert_eq!(
            parse_date_phrase("this weekend", date(2025, 12, 21), SEASON_YEAR),
            Some(DateSpan::new(date(2025, 12, 20), date(2025, 12, 21)))
        );
    }

    #[test]
    fn test_weekdays() {
        assert_eq!(
            parse_date_phrase("next Friday", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 19)))
        );
        assert_eq!(
            parse_date_phrase("this Friday", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 19)))
        );
        // "next Monday" from a Monday skips a week.
        assert_eq!(
            parse_date_phrase("next Monday", reference(), SEASON_YEAR),
            Some(DateSpan::single(date(2025, 12, 22)))
        );
    }

    #[test]
    fn test_no_date_mentioned() {
        assert_eq!(parse_date_phrase("flute concerts", reference(), SEASON_YEAR), None);
        assert_eq!(
            parse_date_phrase("Sanjay Subrahmanyan", reference(), SEASON_YEAR),
            None
        );
    }
}
