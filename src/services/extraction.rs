//! Deterministic keyword extraction.
//!
//! The fallback behind the text-understanding service: the same structured
//! shape, produced from keyword tables and date patterns. Also the home of
//! the intent and follow-up classifiers, which run on every query so a
//! service reply that omits them still classifies.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use super::interpreter::{ExtractedQuery, Intent};
use crate::parsing::dates;

static MORNING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:morning|am|early)\b").unwrap());
static AFTERNOON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:afternoon|pm)\b").unwrap());
static EVENING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bevening\b").unwrap());
static NIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:night|late)\b").unwrap());

static FOLLOWUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:filter|only|just|those|these|them|which)\b|\bthe ones\b|\bshow me\b")
        .unwrap()
});

// Artist phrasings. All anchored on capitalized names so bare free text is
// left to the substring fallback rather than misread as an artist.
static ARTIST_BY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bby\s+([A-Z][A-Za-z.\s&]+?)(?:\s+(?:concert|performing|singing|at|on)\b|[,.?!]|$)")
        .unwrap()
});
static ARTIST_VERB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z.\s&]+?)\s+(?:singing|performing)\b").unwrap());
static ARTIST_CONCERT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z.\s&]+?)(?:'s)?\s+concerts?\b").unwrap());

static VENUE_AT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\bat|\bin)\s+(?:the\s+)?([A-Z][A-Za-z.\s]{2,}?)(?:\s+on\b|\s+concert\b|[,.?!]|$)")
        .unwrap()
});

/// Venues common enough to recognize without capitalization.
const KNOWN_VENUES: [&str; 9] = [
    "music academy",
    "krishna gana sabha",
    "mylapore fine arts",
    "narada gana sabha",
    "bharatiya vidya bhavan",
    "vani mahal",
    "kalakshetra",
    "arkay convention",
    "sri ygp auditorium",
];

/// Area names, most specific first.
const KNOWN_AREAS: [&str; 6] = [
    "mylapore",
    "t. nagar",
    "t nagar",
    "adyar",
    "besant nagar",
    "nagar",
];

const STOP_WORDS: [&str; 15] = [
    "the", "a", "an", "at", "on", "in", "by", "me", "when", "where", "what", "is", "are",
    "show", "find",
];

/// Extract a structured query from plain keywords, the shape the
/// text-understanding service would have returned.
pub fn extract_keywords(text: &str, reference: NaiveDate, season_year: i32) -> ExtractedQuery {
    let lower = text.to_lowercase();
    let mut extracted = ExtractedQuery {
        is_followup: detect_followup(text),
        intent: Some(intent_name(classify_intent(text)).to_string()),
        ..ExtractedQuery::default()
    };

    if let Some(span) = dates::parse_date_phrase(text, reference, season_year) {
        if span.is_single_day() {
            extracted.date = Some(span.start.to_string());
        } else {
            extracted.date_range = Some(vec![span.start.to_string(), span.end.to_string()]);
        }
    }

    extracted.ticketed = extract_ticketing(&lower).map(str::to_string);
    extracted.time_of_day = extract_time_of_day(&lower).map(str::to_string);
    extracted.venue = extract_venue(text, &lower);
    extracted.location = extract_location(&lower);
    extracted.artist = extract_artist(text);

    extracted
}

/// Keyword intent classification; `Search` when nothing else fits.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if ["route", "plan", "directions", "travel"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Intent::RoutePlanning
    } else if ["help", "what can", "how can"].iter().any(|k| lower.contains(k)) {
        Intent::Help
    } else if ["info", "information", "tell me about"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Intent::Info
    } else {
        Intent::Search
    }
}

/// Marker words suggesting the user is refining previous results.
pub fn detect_followup(text: &str) -> bool {
    FOLLOWUP_RE.is_match(&text.to_lowercase())
}

fn intent_name(intent: Intent) -> &'static str {
    match intent {
        Intent::Search => "search",
        Intent::RoutePlanning => "route_planning",
        Intent::Info => "info",
        Intent::Help => "help",
    }
}

fn extract_ticketing(lower: &str) -> Option<&'static str> {
    if ["free", "no ticket", "no charge", "complimentary"]
        .iter()
        .any(|k| lower.contains(k))
    {
        Some("Free")
    } else if ["ticketed", "paid", "ticket"].iter().any(|k| lower.contains(k)) {
        Some("Ticketed")
    } else {
        None
    }
}

fn extract_time_of_day(lower: &str) -> Option<&'static str> {
    if MORNING_RE.is_match(lower) {
        Some("morning")
    } else if AFTERNOON_RE.is_match(lower) {
        Some("afternoon")
    } else if EVENING_RE.is_match(lower) {
        Some("evening")
    } else if NIGHT_RE.is_match(lower) {
        Some("night")
    } else {
        None
    }
}

fn extract_venue(text: &str, lower: &str) -> Option<String> {
    if let Some(captures) = VENUE_AT_RE.captures(text) {
        let candidate = clean_name(&captures[1]);
        if candidate.len() > 2 {
            return Some(candidate);
        }
    }
    KNOWN_VENUES
        .iter()
        .find(|venue| lower.contains(*venue))
        .map(|venue| title_case(venue))
}

fn extract_location(lower: &str) -> Option<String> {
    KNOWN_AREAS
        .iter()
        .find(|area| lower.contains(*area))
        .map(|area| title_case(area))
}

fn extract_artist(text: &str) -> Option<String> {
    for pattern in [&*ARTIST_BY_RE, &*ARTIST_VERB_RE, &*ARTIST_CONCERT_RE] {
        if let Some(captures) = pattern.captures(text) {
            let candidate = clean_name(&captures[1]);
            if candidate.len() > 2
                && !STOP_WORDS.contains(&candidate.to_lowercase().as_str())
            {
                return Some(candidate);
            }
        }
    }
    None
}

/// Strip leading question words and trailing connectives off a captured
/// name.
fn clean_name(raw: &str) -> String {
    let mut words: Vec<&str> = raw.split_whitespace().collect();
    while let Some(first) = words.first() {
        if STOP_WORDS.contains(&first.to_lowercase().as_str()) {
            words.remove(0);
        } else {
            break;
        }
    }
    while let Some(last) = words.last() {
        if STOP_WORDS.contains(&last.to_lowercase().as_str()) {
            words.pop();
        } else {
            break;
        }
    }
    words.join(" ")
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
