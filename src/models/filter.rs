//! Structured concert filters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::concert::{Ticketing, TimeOfDay};

/// Inclusive calendar-date span. A single day is `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Span over `[start, end]`; the bounds are swapped when given inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn is_single_day(&self) -> bool {
        self.start == self.end
    }
}

/// Structured concert filter. Every field is optional; the empty filter
/// matches everything. Fields combine with logical AND, except `free_text`,
/// which matches across the artist and venue fields and exists as the
/// degraded form of an uninterpretable query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    /// Area hint ("Mylapore"); matched against venue names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticketing: Option<Ticketing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.dates.is_none()
            && self.artist.is_none()
            && self.venue.is_none()
            && self.location.is_none()
            && self.time_of_day.is_none()
            && self.ticketing.is_none()
            && self.free_text.is_none()
    }

    /// Degraded filter: substring matching of the raw text across artist and
    /// venue fields.
    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            free_text: Some(text.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter() {
        assert!(Filter::default().is_empty());
        assert!(!Filter::free_text("sanjay").is_empty());
    }

    #[test]
    fn test_span_swaps_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let span = DateSpan::new(a, b);
        assert_eq!(span.start, b);
        assert_eq!(span.end, a);
        assert!(span.contains(NaiveDate::from_ymd_opt(2025, 12, 18).unwrap()));
        assert!(span.contains(a));
        assert!(span.contains(b));
        assert!(!span.contains(NaiveDate::from_ymd_opt(2025, 12, 21).unwrap()));
    }
}
