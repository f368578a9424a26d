//! Concert records and their time representation.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Concert identifier (dense index assigned at load).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConcertId(pub u32);

impl fmt::Display for ConcertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticketing status as printed in the organizer listing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ticketing {
    Free,
    Ticketed,
}

impl Ticketing {
    /// Parse a listing value or a user phrase ("free", "paid", "ticketed").
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "free" | "complimentary" => Some(Ticketing::Free),
            "ticketed" | "paid" | "ticket" | "tickets" => Some(Ticketing::Ticketed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ticketing::Free => "Free",
            Ticketing::Ticketed => "Ticketed",
        }
    }
}

/// Time-of-day bucket.
///
/// Buckets are half-open on the hour: morning `[06:00, 12:00)`, afternoon
/// `[12:00, 17:00)`, evening `[17:00, 21:00)`, night `[21:00, 24:00)`.
/// A 17:00 concert is an evening concert.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// Bucket containing the given clock time, if any. Times before 06:00
    /// fall outside every bucket.
    pub fn of(time: NaiveTime) -> Option<TimeOfDay> {
        match time.hour() {
            6..=11 => Some(TimeOfDay::Morning),
            12..=16 => Some(TimeOfDay::Afternoon),
            17..=20 => Some(TimeOfDay::Evening),
            21..=23 => Some(TimeOfDay::Night),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<TimeOfDay> {
        match value.trim().to_lowercase().as_str() {
            "morning" => Some(TimeOfDay::Morning),
            "afternoon" => Some(TimeOfDay::Afternoon),
            "evening" => Some(TimeOfDay::Evening),
            "night" => Some(TimeOfDay::Night),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Start time of a concert as printed by the organizer.
///
/// Organizer feeds mix 12-hour clock times, explicit ranges, and textual
/// periods; an unrecognized value is kept verbatim as a phrase so the record
/// still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    Clock(NaiveTime),
    Range { start: NaiveTime, end: NaiveTime },
    Phrase(String),
}

impl EventTime {
    /// Parse an organizer time field. Never fails; unparsable input becomes
    /// [`EventTime::Phrase`].
    pub fn parse(raw: &str) -> EventTime {
        let trimmed = raw.trim();
        for sep in [" - ", "-", " to "] {
            if let Some((lhs, rhs)) = trimmed.split_once(sep) {
                if let (Some(start), Some(end)) = (parse_clock(lhs), parse_clock(rhs)) {
                    return EventTime::Range { start, end };
                }
            }
        }
        match parse_clock(trimmed) {
            Some(time) => EventTime::Clock(time),
            None => EventTime::Phrase(trimmed.to_string()),
        }
    }

    /// Clock start, when one was printed.
    pub fn start(&self) -> Option<NaiveTime> {
        match self {
            EventTime::Clock(t) => Some(*t),
            EventTime::Range { start, .. } => Some(*start),
            EventTime::Phrase(_) => None,
        }
    }

    /// Explicit clock end, when a range was printed.
    pub fn end(&self) -> Option<NaiveTime> {
        match self {
            EventTime::Range { end, .. } => Some(*end),
            _ => None,
        }
    }

    /// Bucket this time falls into. Ranges bucket by their start; phrases
    /// match by bucket name only.
    pub fn bucket(&self) -> Option<TimeOfDay> {
        match self {
            EventTime::Clock(t) => TimeOfDay::of(*t),
            EventTime::Range { start, .. } => TimeOfDay::of(*start),
            EventTime::Phrase(p) => TimeOfDay::parse(p),
        }
    }
}

/// Parse one clock value: "6:45 PM", "6 PM", "7am", "18:15".
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let lower = raw.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    let (digits, meridiem) = if let Some(stripped) = lower.strip_suffix("am") {
        (stripped.trim_end(), Some(false))
    } else if let Some(stripped) = lower.strip_suffix("pm") {
        (stripped.trim_end(), Some(true))
    } else {
        (lower.as_str(), None)
    };
    let (hour_part, minute_part) = match digits.split_once(':') {
        Some((h, m)) => (h.trim(), m.trim()),
        None => (digits.trim(), "0"),
    };
    let hour: u32 = hour_part.parse().ok()?;
    let minute: u32 = minute_part.parse().ok()?;
    let hour = match meridiem {
        Some(true) if hour != 12 => hour + 12,
        Some(false) if hour == 12 => 0,
        _ => hour,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// A single concert listing. Immutable once loaded; the store owns the only
/// copy and hands out [`ConcertId`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcertRecord {
    pub id: ConcertId,
    pub date: NaiveDate,
    pub time: EventTime,
    /// Time field exactly as printed, for display.
    pub time_display: String,
    /// Artist credit line exactly as printed.
    pub artist_line: String,
    /// Individual artist names split out of the credit line.
    pub artists: Vec<String>,
    pub details: String,
    pub venue: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hall: Option<String>,
    /// Organizer that published the listing.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticketing: Option<Ticketing>,
}

impl ConcertRecord {
    /// Combined start instant, when a clock time was printed.
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        self.time.start().map(|t| self.date.and_time(t))
    }

    /// Combined end instant: the printed range end, else start plus the
    /// assumed duration. An end printed earlier than the start is treated as
    /// unprinted.
    pub fn end_datetime(&self, assumed_minutes: i64) -> Option<NaiveDateTime> {
        let start = self.start_datetime()?;
        match self.time.end() {
            Some(end) if end > self.time.start().unwrap_or(end) => {
                Some(self.date.and_time(end))
            }
            _ => Some(start + Duration::minutes(assumed_minutes)),
        }
    }
}

static ARTIST_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:;|,|&|\band\b)\s*").unwrap());

/// Split an organizer credit line into individual artist names.
pub fn split_artist_credits(line: &str) -> Vec<String> {
    let mut names = Vec::new();
    for part in ARTIST_SEPARATORS.split(line) {
        let name = part.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
