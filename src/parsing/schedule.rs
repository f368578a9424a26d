//! Organizer schedule ingestion.
//!
//! Schedules arrive as tab- or comma-separated tables with a header row.
//! The loader is strict about the table shape (missing required columns are
//! fatal) and lenient about individual rows: a row with an unparsable date
//! or an empty artist or venue field is skipped and counted, never fatal.
//! Exact duplicate listings published by more than one organizer source are
//! collapsed.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{split_artist_credits, ConcertId, ConcertRecord, EventTime, Ticketing};

/// Fatal problems with a schedule source.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("failed to read schedule input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed tabular input: {0}")]
    Malformed(#[from] csv::Error),
    #[error("required column '{0}' is missing")]
    MissingColumn(&'static str),
}

/// Result of loading one schedule source.
#[derive(Debug)]
pub struct ScheduleLoadResult {
    pub records: Vec<ConcertRecord>,
    /// Rows dropped because they could not be parsed.
    pub rows_skipped: usize,
    /// Exact duplicate listings collapsed across organizer sources.
    pub rows_deduplicated: usize,
    /// SHA-256 of the raw input, for provenance.
    pub checksum: String,
}

/// Load a schedule file. The delimiter is sniffed from the header line, so
/// the organizers' tab-separated `.txt` exports and comma-separated `.csv`
/// exports both load.
pub fn load_schedule_path(path: &Path) -> Result<ScheduleLoadResult, DataFormatError> {
    let raw = fs::read_to_string(path)?;
    load_schedule_str(&raw)
}

/// Load a schedule from an in-memory table.
pub fn load_schedule_str(input: &str) -> Result<ScheduleLoadResult, DataFormatError> {
    let delimiter = sniff_delimiter(input);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(input.as_bytes());

    let headers = reader.headers()?.clone();
    let date_col = find_column(&headers, &["date"]).ok_or(DataFormatError::MissingColumn("Date"))?;
    let time_col = find_column(&headers, &["time"]).ok_or(DataFormatError::MissingColumn("Time"))?;
    let artist_col = find_column(&headers, &["artist(s)", "artists", "artist"])
        .ok_or(DataFormatError::MissingColumn("Artist(s)"))?;
    // `Sabha` is the organizer's older name for the venue column.
    let venue_col = find_column(&headers, &["venue", "sabha"])
        .ok_or(DataFormatError::MissingColumn("Venue"))?;
    let details_col = find_column(&headers, &["instruments/details", "details", "instruments"]);
    let source_col = find_column(&headers, &["source"]);
    let hall_col = find_column(&headers, &["hall"]);
    let ticketed_col = find_column(&headers, &["ticketed"]);

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut rows_skipped = 0usize;
    let mut rows_deduplicated = 0usize;

    for (row, result) in reader.records().enumerate() {
        let line = row + 2; // 1-based, after the header
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                rows_skipped += 1;
                warn!(line, %err, "skipping unreadable schedule row");
                continue;
            }
        };

        let date_raw = field(&record, date_col);
        let date = match parse_load_date(date_raw) {
            Some(date) => date,
            None => {
                rows_skipped += 1;
                warn!(line, value = date_raw, "skipping row with unparsable date");
                continue;
            }
        };

        let artist_line = field(&record, artist_col);
        if artist_line.is_empty() {
            rows_skipped += 1;
            warn!(line, "skipping row without artists");
            continue;
        }

        let venue = field(&record, venue_col);
        if venue.is_empty() {
            rows_skipped += 1;
            warn!(line, "skipping row without a venue");
            continue;
        }

        let time_display = field(&record, time_col).to_string();
        let key = dedup_key(date, &time_display, artist_line, venue);
        if !seen.insert(key) {
            rows_deduplicated += 1;
            continue;
        }

        records.push(ConcertRecord {
            id: ConcertId(records.len() as u32),
            date,
            time: EventTime::parse(&time_display),
            time_display,
            artist_line: artist_line.to_string(),
            artists: split_artist_credits(artist_line),
            details: details_col.map(|c| field(&record, c).to_string()).unwrap_or_default(),
            venue: venue.to_string(),
            hall: hall_col.map(|c| field(&record, c)).filter(|h| !h.is_empty()).map(str::to_string),
            source: source_col.map(|c| field(&record, c).to_string()).unwrap_or_default(),
            ticketing: ticketed_col.and_then(|c| Ticketing::parse(field(&record, c))),
        });
    }

    let checksum = hex::encode(Sha256::digest(input.as_bytes()));
    debug!(
        loaded = records.len(),
        rows_skipped, rows_deduplicated, "schedule load complete"
    );

    Ok(ScheduleLoadResult {
        records,
        rows_skipped,
        rows_deduplicated,
        checksum,
    })
}

fn sniff_delimiter(input: &str) -> u8 {
    match input.lines().next() {
        Some(header) if header.contains('\t') => b'\t',
        _ => b',',
    }
}

fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("").trim()
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.iter().any(|name| header.trim().eq_ignore_ascii_case(name)))
}

/// Organizer sources print `15-Dec-2025`; combined exports use ISO or
/// slash dates. Tried in that order.
fn parse_load_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 4] = ["%d-%b-%Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn dedup_key(date: NaiveDate, time: &str, artists: &str, venue: &str) -> String {
    let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("{date}\x1f{}\x1f{}\x1f{}", squash(time), squash(artists), squash(venue))
}
