//! Load-and-query behavior over the fixture schedule.

mod support;

use chrono::NaiveDate;
use margazhi_planner::models::{DateSpan, Filter, Ticketing, TimeOfDay};
use margazhi_planner::parsing::schedule;
use margazhi_planner::ScheduleStore;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
}

#[test]
fn empty_query_returns_exactly_the_parsed_rows() {
    let result = schedule::load_schedule_path(&support::fixture_path()).unwrap();
    // 12 data rows: one unparsable, one duplicate listing.
    assert_eq!(result.rows_skipped, 1);
    assert_eq!(result.rows_deduplicated, 1);
    let loaded = result.records.len();
    assert_eq!(loaded, 10);

    let store = ScheduleStore::new(result);
    assert_eq!(store.query(&Filter::default()).len(), loaded);
    assert_eq!(store.rows_skipped(), 1);
    assert_eq!(store.rows_deduplicated(), 1);
}

#[test]
fn date_only_filter_stays_inside_the_span() {
    let store = support::sample_store();
    let span = DateSpan::new(date(16), date(18));
    let hits = store.query(&Filter {
        dates: Some(span),
        ..Filter::default()
    });
    assert_eq!(hits.len(), 4);
    for id in &hits {
        assert!(span.contains(store.get(*id).unwrap().date));
    }

    // Inclusive on both ends: the boundary days themselves match.
    let boundary = store.query(&Filter {
        dates: Some(DateSpan::single(date(18))),
        ..Filter::default()
    });
    assert_eq!(boundary.len(), 2);
}

#[test]
fn venue_and_ticketing_filters_combine() {
    let store = support::sample_store();
    let hits = store.query(&Filter {
        venue: Some("music academy".to_string()),
        ticketing: Some(Ticketing::Ticketed),
        ..Filter::default()
    });
    assert_eq!(hits.len(), 3);
}

#[test]
fn phrase_times_match_buckets_by_name() {
    let store = support::sample_store();
    let hits = store.query(&Filter {
        dates: Some(DateSpan::single(date(16))),
        time_of_day: Some(TimeOfDay::Evening),
        ..Filter::default()
    });
    // The "Evening" listing without a clock time still lands in the bucket.
    assert_eq!(hits.len(), 1);
    assert_eq!(store.get(hits[0]).unwrap().artist_line, "Sikkil Gurucharan");
}

#[test]
fn range_times_bucket_by_start() {
    let store = support::sample_store();
    let hits = store.query(&Filter {
        dates: Some(DateSpan::single(date(15))),
        time_of_day: Some(TimeOfDay::Afternoon),
        ..Filter::default()
    });
    // 4:00 PM - 6:00 PM starts in the afternoon bucket.
    assert_eq!(hits.len(), 1);
    assert_eq!(store.get(hits[0]).unwrap().artist_line, "Bombay Jayashri");
}

#[test]
fn artist_matching_survives_separator_variation() {
    let store = support::sample_store();
    for query in ["Ranjani & Gayatri", "Ranjani Gayatri", "ranjani-gayatri"] {
        let hits = store.query(&Filter {
            artist: Some(query.to_string()),
            ..Filter::default()
        });
        assert_eq!(hits.len(), 1, "query {query:?}");
        assert_eq!(
            store.get(hits[0]).unwrap().venue,
            "Mylapore Fine Arts Club",
            "query {query:?}"
        );
    }
}

#[test]
fn checksum_and_date_range_describe_the_dataset() {
    let store = support::sample_store();
    assert_eq!(store.checksum().len(), 64);
    assert_eq!(store.date_range(), Some((date(15), date(20))));
    assert!(store.venues().contains(&"Krishna Gana Sabha".to_string()));
}
