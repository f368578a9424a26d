//! Free text → structured interpretation.
//!
//! The interpreter sends the user's text, together with grounding vocabulary
//! from the loaded schedule, to the text-understanding collaborator and
//! decodes its JSON reply into a [`Filter`] plus an intent. An unusable
//! reply never fails the pipeline: the interpreter degrades to the keyword
//! extractor, and from there to a raw-text substring filter.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::extraction;
use crate::models::{DateSpan, Filter, Ticketing, TimeOfDay};
use crate::parsing::dates;
use crate::store::ScheduleStore;

/// What the user wants done with the matched concerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    RoutePlanning,
    Info,
    Help,
}

impl Intent {
    pub fn parse(value: &str) -> Option<Intent> {
        match value.trim().to_lowercase().as_str() {
            "search" => Some(Intent::Search),
            "route_planning" | "route planning" => Some(Intent::RoutePlanning),
            "info" => Some(Intent::Info),
            "help" => Some(Intent::Help),
            _ => None,
        }
    }
}

/// Raw structured reply from the text-understanding service. Every field is
/// optional; absent keys deserialize to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_range: Option<Vec<String>>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub ticketed: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub is_followup: bool,
}

/// Unusable reply from the text-understanding service. Recoverable
/// everywhere: the interpreter converts it into the degraded path.
#[derive(Debug, Error)]
pub enum IntentParseError {
    #[error("text-understanding service error: {0}")]
    Service(String),
    #[error("service reply carries no JSON object")]
    MissingJson,
    #[error("malformed extraction JSON at {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Grounding vocabulary sent along with the user text so the service can
/// anchor ambiguous references to real venues and artists.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub venues: Vec<String>,
    pub artists: Vec<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub total_concerts: usize,
}

impl Vocabulary {
    /// Sample of the loaded schedule, capped so prompts stay small.
    pub fn from_store(store: &ScheduleStore) -> Self {
        let mut venues = store.venues();
        venues.truncate(25);
        let mut artists = store.artists();
        artists.truncate(40);
        Self {
            venues,
            artists,
            date_range: store.date_range(),
            total_concerts: store.len(),
        }
    }
}

/// Text-understanding collaborator. One attempt; returns the raw reply text.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
    ) -> Result<String, IntentParseError>;
}

/// Outcome of interpreting one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub filter: Filter,
    pub intent: Intent,
    pub is_followup: bool,
    /// True when the structured service reply was unusable and keyword or
    /// raw-text matching took over.
    pub degraded: bool,
}

pub struct QueryInterpreter {
    extractor: Option<Arc<dyn IntentExtractor>>,
    season_year: i32,
}

impl QueryInterpreter {
    pub fn new(extractor: Arc<dyn IntentExtractor>, season_year: i32) -> Self {
        Self {
            extractor: Some(extractor),
            season_year,
        }
    }

    /// Interpreter without a text-understanding collaborator; every query
    /// goes through the keyword extractor.
    pub fn offline(season_year: i32) -> Self {
        Self {
            extractor: None,
            season_year,
        }
    }

    /// Interpret one user message. Never fails: service trouble degrades to
    /// keyword extraction, and an empty extraction to a raw-text filter.
    /// Date phrases resolve against `reference`, so interpretation is
    /// deterministic.
    pub async fn interpret(
        &self,
        text: &str,
        vocabulary: &Vocabulary,
        reference: NaiveDate,
    ) -> Interpretation {
        let extracted = match &self.extractor {
            Some(extractor) => match extractor.extract(text, vocabulary).await {
                Ok(reply) => match parse_reply(&reply) {
                    Ok(extracted) => Some(extracted),
                    Err(err) => {
                        warn!(%err, "unusable extraction reply; degrading to keywords");
                        None
                    }
                },
                Err(err) => {
                    warn!(%err, "text-understanding call failed; degrading to keywords");
                    None
                }
            },
            None => None,
        };

        match extracted {
            Some(extracted) => self.resolve(extracted, text, reference, false),
            None => self.fallback(text, reference),
        }
    }

    fn fallback(&self, text: &str, reference: NaiveDate) -> Interpretation {
        let extracted = extraction::extract_keywords(text, reference, self.season_year);
        let mut interpretation = self.resolve(extracted, text, reference, true);
        if interpretation.filter.is_empty() {
            interpretation.filter = Filter::free_text(text.trim());
        }
        interpretation
    }

    /// Deterministic post-processing of an extraction, shared by the service
    /// and keyword paths.
    fn resolve(
        &self,
        extracted: ExtractedQuery,
        text: &str,
        reference: NaiveDate,
        degraded: bool,
    ) -> Interpretation {
        let mut filter = Filter::default();

        if let Some(range) = extracted.date_range.as_ref().filter(|r| r.len() == 2) {
            let start = dates::parse_date_phrase(&range[0], reference, self.season_year);
            let end = dates::parse_date_phrase(&range[1], reference, self.season_year);
            if let (Some(start), Some(end)) = (start, end) {
                filter.dates = Some(DateSpan::new(start.start, end.end));
            }
        }
        if filter.dates.is_none() {
            if let Some(raw) = extracted.date.as_deref() {
                filter.dates = dates::parse_date_phrase(raw, reference, self.season_year);
            }
        }

        filter.artist = non_empty(extracted.artist);
        filter.venue = non_empty(extracted.venue);
        filter.location = non_empty(extracted.location);
        filter.time_of_day = extracted.time_of_day.as_deref().and_then(TimeOfDay::parse);
        filter.ticketing = extracted.ticketed.as_deref().and_then(Ticketing::parse);

        let intent = extracted
            .intent
            .as_deref()
            .and_then(Intent::parse)
            .unwrap_or_else(|| extraction::classify_intent(text));
        let is_followup = extracted.is_followup || extraction::detect_followup(text);

        Interpretation {
            filter,
            intent,
            is_followup,
            degraded,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

static FENCED_JSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

/// Decode the service reply into an [`ExtractedQuery`].
///
/// Replies routinely arrive wrapped in Markdown code fences or surrounded by
/// prose; the first JSON object is fished out before decoding.
pub fn parse_reply(reply: &str) -> Result<ExtractedQuery, IntentParseError> {
    let candidate = match FENCED_JSON_RE.captures(reply) {
        Some(captures) => captures[1].to_string(),
        None => first_json_object(reply)
            .ok_or(IntentParseError::MissingJson)?
            .to_string(),
    };

    let mut deserializer = serde_json::Deserializer::from_str(&candidate);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        IntentParseError::Malformed {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    })
}

/// First balanced `{...}` in the text, string contents included in the
/// balance count only when outside quotes.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            if c != '\\' {
                escaped = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()
    }

    #[test]
    fn test_parse_reply_plain_json() {
        let reply = r#"{"artist": "T.M. Krishna", "intent": "search"}"#;
        let extracted = parse_reply(reply).unwrap();
        assert_eq!(extracted.artist.as_deref(), Some("T.M. Krishna"));
    }

    #[test]
    fn test_parse_reply_fenced_json() {
        let reply = "Here you go:\n```json\n{\"venue\": \"Music Academy\", \"is_followup\": true}\n```\nAnything else?";
        let extracted = parse_reply(reply).unwrap();
        assert_eq!(extracted.venue.as_deref(), Some("Music Academy"));
        assert!(extracted.is_followup);
    }

    #[test]
    fn test_parse_reply_embedded_object() {
        let reply = "The extraction is {\"date\": \"2025-12-18\", \"time_of_day\": \"evening\"} as requested.";
        let extracted = parse_reply(reply).unwrap();
        assert_eq!(extracted.date.as_deref(), Some("2025-12-18"));
    }

    #[test]
    fn test_parse_reply_without_json_fails() {
        assert!(matches!(
            parse_reply("I could not understand the question."),
            Err(IntentParseError::MissingJson)
        ));
    }

    #[test]
    fn test_parse_reply_wrong_shape_reports_path() {
        let reply = r#"{"date_range": 7}"#;
        match parse_reply(reply) {
            Err(IntentParseError::Malformed { path, .. }) => {
                assert!(path.contains("date_range"), "path was {path}");
            }
            other => panic!("expected a malformed error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unusable_reply_degrades_to_raw_text_filter() {
        struct Garbage;

        #[async_trait]
        impl IntentExtractor for Garbage {
            async fn extract(
                &self,
                _text: &str,
                _vocabulary: &Vocabulary,
            ) -> Result<String, IntentParseError> {
                Ok("sorry, no structure here".to_string())
            }
        }

        let interpreter = QueryInterpreter::new(Arc::new(Garbage), 2025);
        let interpretation = interpreter
            .interpret("Chitraveena Ravikiran", &Vocabulary::default(), reference())
            .await;
        assert!(interpretation.degraded);
        assert_eq!(
            interpretation.filter,
            Filter::free_text("Chitraveena Ravikiran")
        );
        assert_eq!(interpretation.intent, Intent::Search);
    }

    #[tokio::test]
    async fn test_service_reply_resolves_dates_and_buckets() {
        struct Canned;

        #[async_trait]
        impl IntentExtractor for Canned {
            async fn extract(
                &self,
                _text: &str,
                _vocabulary: &Vocabulary,
            ) -> Result<String, IntentParseError> {
                Ok(r#"{"date": "Dec 18", "location": "Mylapore", "time_of_day": "evening", "intent": "search", "is_followup": false}"#.to_string())
            }
        }

        let interpreter = QueryInterpreter::new(Arc::new(Canned), 2025);
        let interpretation = interpreter
            .interpret(
                "Show me concerts near Mylapore on Dec 18 evening",
                &Vocabulary::default(),
                reference(),
            )
            .await;
        assert!(!interpretation.degraded);
        let span = interpretation.filter.dates.unwrap();
        assert_eq!(span.start, NaiveDate::from_ymd_opt(2025, 12, 18).unwrap());
        assert!(span.is_single_day());
        assert_eq!(interpretation.filter.location.as_deref(), Some("Mylapore"));
        assert_eq!(interpretation.filter.time_of_day, Some(TimeOfDay::Evening));
    }

    #[tokio::test]
    async fn test_offline_interpreter_uses_keywords() {
        let interpreter = QueryInterpreter::offline(2025);
        let interpretation = interpreter
            .interpret("free concerts tomorrow evening", &Vocabulary::default(), reference())
            .await;
        assert!(interpretation.degraded);
        assert_eq!(
            interpretation.filter.dates,
            Some(DateSpan::single(NaiveDate::from_ymd_opt(2025, 12, 16).unwrap()))
        );
        assert_eq!(interpretation.filter.time_of_day, Some(TimeOfDay::Evening));
        assert_eq!(interpretation.filter.ticketing, Some(Ticketing::Free));
    }

    #[tokio::test]
    async fn test_route_intent_classification_from_text() {
        let interpreter = QueryInterpreter::offline(2025);
        let interpretation = interpreter
            .interpret(
                "plan a route between my concerts on Dec 20",
                &Vocabulary::default(),
                reference(),
            )
            .await;
        assert_eq!(interpretation.intent, Intent::RoutePlanning);
    }
}
