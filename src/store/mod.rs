//! Immutable in-memory schedule store.
//!
//! The store is built once from a load result and never mutated afterwards;
//! queries return [`ConcertId`]s in chronological order. Text matching is
//! case-insensitive throughout. Artist lookups use a tiered strategy carried
//! over from the production matcher: an exact normalized-phrase match beats
//! a whole-word AND match, which beats a plain substring scan. The first
//! tier with any hit wins, which keeps "Ranjani Gayatri" from drowning in
//! partial-name false positives.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{ConcertId, ConcertRecord, Filter};
use crate::parsing::schedule::{self, DataFormatError, ScheduleLoadResult};

pub struct ScheduleStore {
    records: Vec<ConcertRecord>,
    by_date: BTreeMap<NaiveDate, Vec<ConcertId>>,
    /// Lowercase token → records whose artist line or venue carries it.
    tokens: HashMap<String, Vec<ConcertId>>,
    checksum: String,
    rows_skipped: usize,
    rows_deduplicated: usize,
}

impl ScheduleStore {
    /// Build the store and its indexes from a load result.
    pub fn new(result: ScheduleLoadResult) -> Self {
        let ScheduleLoadResult {
            records,
            rows_skipped,
            rows_deduplicated,
            checksum,
        } = result;

        let mut by_date: BTreeMap<NaiveDate, Vec<ConcertId>> = BTreeMap::new();
        for record in &records {
            by_date.entry(record.date).or_default().push(record.id);
        }
        for ids in by_date.values_mut() {
            ids.sort_by_key(|id| {
                let record = &records[id.0 as usize];
                // Records without a clock time sort after timed ones.
                (record.time.start().is_none(), record.time.start(), *id)
            });
        }

        let mut tokens: HashMap<String, Vec<ConcertId>> = HashMap::new();
        for record in &records {
            let mut seen = HashSet::new();
            for token in tokenize(&record.artist_line).chain(tokenize(&record.venue)) {
                if seen.insert(token.clone()) {
                    tokens.entry(token).or_default().push(record.id);
                }
            }
        }

        debug!(
            concerts = records.len(),
            days = by_date.len(),
            tokens = tokens.len(),
            "schedule store ready"
        );
        Self {
            records,
            by_date,
            tokens,
            checksum,
            rows_skipped,
            rows_deduplicated,
        }
    }

    pub fn load_path(path: &Path) -> Result<Self, DataFormatError> {
        Ok(Self::new(schedule::load_schedule_path(path)?))
    }

    pub fn load_str(input: &str) -> Result<Self, DataFormatError> {
        Ok(Self::new(schedule::load_schedule_str(input)?))
    }

    pub fn get(&self, id: ConcertId) -> Option<&ConcertRecord> {
        self.records.get(id.0 as usize)
    }

    pub fn records(&self) -> &[ConcertRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    pub fn rows_deduplicated(&self) -> usize {
        self.rows_deduplicated
    }

    /// First and last concert dates in the loaded season.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.by_date.keys().next()?;
        let last = self.by_date.keys().next_back()?;
        Some((*first, *last))
    }

    /// Sorted unique venue names.
    pub fn venues(&self) -> Vec<String> {
        let mut venues: Vec<String> = self
            .records
            .iter()
            .map(|r| r.venue.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        venues.sort();
        venues
    }

    /// Sorted unique artist names, split out of the credit lines.
    pub fn artists(&self) -> Vec<String> {
        let mut artists: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.artists.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        artists.sort();
        artists
    }

    /// Return the concerts matching every non-empty filter field, in
    /// chronological order. No match is an empty vector, never an error.
    pub fn query(&self, filter: &Filter) -> Vec<ConcertId> {
        // Tier selection for artist and free-text matching is made over the
        // whole dataset, then intersected with the remaining fields.
        let artist_ids = filter.artist.as_deref().map(|q| self.match_artists(q));
        let text_ids = filter.free_text.as_deref().map(|q| self.match_free_text(q));

        let mut out = Vec::new();
        let range = match filter.dates {
            Some(span) => self.by_date.range(span.start..=span.end),
            None => self.by_date.range(..),
        };
        for (_, ids) in range {
            for id in ids {
                let record = &self.records[id.0 as usize];
                if let Some(venue) = filter.venue.as_deref() {
                    if !contains_ci(&record.venue, venue) {
                        continue;
                    }
                }
                if let Some(location) = filter.location.as_deref() {
                    if !contains_ci(&record.venue, location) {
                        continue;
                    }
                }
                if let Some(bucket) = filter.time_of_day {
                    if record.time.bucket() != Some(bucket) {
                        continue;
                    }
                }
                if let Some(ticketing) = filter.ticketing {
                    if record.ticketing != Some(ticketing) {
                        continue;
                    }
                }
                if let Some(ids) = &artist_ids {
                    if !ids.contains(id) {
                        continue;
                    }
                }
                if let Some(ids) = &text_ids {
                    if !ids.contains(id) {
                        continue;
                    }
                }
                out.push(*id);
            }
        }
        out
    }

    /// Intersect a follow-up query with a previous result set, keeping the
    /// chronological order of the new query.
    pub fn refine(&self, previous: &[ConcertId], filter: &Filter) -> Vec<ConcertId> {
        let keep: HashSet<ConcertId> = previous.iter().copied().collect();
        self.query(filter)
            .into_iter()
            .filter(|id| keep.contains(id))
            .collect()
    }

    fn match_artists(&self, query: &str) -> HashSet<ConcertId> {
        let normalized_query = normalize_separators(query);
        if normalized_query.is_empty() {
            return HashSet::new();
        }

        // Tier 1: exact phrase containment, either direction.
        let tier1: HashSet<ConcertId> = self
            .records
            .iter()
            .filter(|r| {
                let line = normalize_separators(&r.artist_line);
                line.contains(&normalized_query) || normalized_query.contains(&line)
            })
            .map(|r| r.id)
            .collect();
        if !tier1.is_empty() {
            return tier1;
        }

        // Tier 2: every query token (longer than two characters) appears as
        // a whole word somewhere in the record, via the token index. Venue
        // tokens are indexed too, but an artist filter intersects on the
        // artist line below, so this stays an artist match.
        let query_tokens: Vec<String> =
            tokenize(query).filter(|t| t.len() > 2).collect();
        if query_tokens.len() > 1 {
            let tier2 = self.records_with_all_tokens(&query_tokens);
            let tier2: HashSet<ConcertId> = tier2
                .into_iter()
                .filter(|id| {
                    let line = normalize_separators(&self.records[id.0 as usize].artist_line);
                    query_tokens
                        .iter()
                        .all(|token| tokenize(&line).any(|t| t == *token))
                })
                .collect();
            if !tier2.is_empty() {
                return tier2;
            }
        }

        // Tier 3: plain substring on the raw credit line.
        self.records
            .iter()
            .filter(|r| contains_ci(&r.artist_line, query))
            .map(|r| r.id)
            .collect()
    }

    fn match_free_text(&self, text: &str) -> HashSet<ConcertId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return self.records.iter().map(|r| r.id).collect();
        }

        let by_artist = self.match_artists(trimmed);
        if !by_artist.is_empty() {
            return by_artist;
        }

        let whole: HashSet<ConcertId> = self
            .records
            .iter()
            .filter(|r| contains_ci(&r.artist_line, trimmed) || contains_ci(&r.venue, trimmed))
            .map(|r| r.id)
            .collect();
        if !whole.is_empty() {
            return whole;
        }

        // Last resort: any query token, artist or venue, off the index.
        let mut ids = HashSet::new();
        for token in tokenize(trimmed).filter(|t| t.len() > 2) {
            if let Some(hits) = self.tokens.get(&token) {
                ids.extend(hits.iter().copied());
            }
        }
        ids
    }

    /// Records carrying every one of the given tokens.
    fn records_with_all_tokens(&self, query_tokens: &[String]) -> HashSet<ConcertId> {
        let mut result: Option<HashSet<ConcertId>> = None;
        for token in query_tokens {
            let hits: HashSet<ConcertId> = match self.tokens.get(token) {
                Some(ids) => ids.iter().copied().collect(),
                None => return HashSet::new(),
            };
            result = Some(match result {
                Some(acc) => acc.intersection(&hits).copied().collect(),
                None => hits,
            });
        }
        result.unwrap_or_default()
    }
}

/// Lowercase alphanumeric runs; the unit of the token index.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Collapse the separators organizers vary on (`-`, `&`) into spaces,
/// squeeze whitespace, lowercase.
pub(crate) fn normalize_separators(s: &str) -> String {
    s.chars()
        .map(|c| if c == '-' || c == '&' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
