//! End-to-end pipeline: free text in, matched concerts and a route out.

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use margazhi_planner::models::{TimeOfDay, TravelMode};
use margazhi_planner::services::interpreter::{Intent, QueryInterpreter, Vocabulary};
use margazhi_planner::ItineraryPlanner;

use support::{CannedExtractor, RoadFactorDirections};

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()
}

#[tokio::test]
async fn mylapore_evening_query_matches_both_concerts() {
    let store = support::sample_store();
    let vocabulary = Vocabulary::from_store(&store);
    let extractor = CannedExtractor {
        reply: r#"```json
{"date": "Dec 18", "date_range": null, "artist": null, "venue": null, "location": "Mylapore", "time_of_day": "evening", "ticketed": null, "intent": "search", "is_followup": false}
```"#
            .to_string(),
    };
    let interpreter = QueryInterpreter::new(Arc::new(extractor), 2025);

    let interpretation = interpreter
        .interpret(
            "Show me concerts near Mylapore on Dec 18 evening",
            &vocabulary,
            reference(),
        )
        .await;
    assert!(!interpretation.degraded);
    assert_eq!(interpretation.intent, Intent::Search);

    let hits = store.query(&interpretation.filter);
    assert_eq!(hits.len(), 2);
    for id in &hits {
        let record = store.get(*id).unwrap();
        assert!(record.venue.to_lowercase().contains("mylapore"));
        // 5:30 PM and 7:00 PM both sit past the 17:00 evening boundary.
        assert_eq!(record.time.bucket(), Some(TimeOfDay::Evening));
    }
}

#[tokio::test]
async fn the_same_query_survives_without_the_service() {
    let store = support::sample_store();
    let vocabulary = Vocabulary::from_store(&store);
    let interpreter = QueryInterpreter::offline(2025);

    let interpretation = interpreter
        .interpret(
            "Show me concerts near Mylapore on Dec 18 evening",
            &vocabulary,
            reference(),
        )
        .await;
    assert!(interpretation.degraded);
    // The keyword extractor still pins the date, area, and bucket.
    let hits = store.query(&interpretation.filter);
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn selection_flows_into_a_planned_route_with_conflict_warnings() {
    let store = support::sample_store();
    let vocabulary = Vocabulary::from_store(&store);
    let interpreter = QueryInterpreter::offline(2025);
    let planner = ItineraryPlanner::new(support::chennai_geocoder())
        .with_directions(Arc::new(RoadFactorDirections { factor: 1.3 }));

    let interpretation = interpreter
        .interpret("concerts near Mylapore on Dec 18 evening", &vocabulary, reference())
        .await;
    let selection = store.query(&interpretation.filter);
    assert_eq!(selection.len(), 2);

    let plan = planner
        .plan_route(&store, &selection, TravelMode::Walking)
        .await
        .unwrap();
    // The 5:30 PM concert runs into the 7:00 PM one under the assumed
    // duration; both stay in the plan, flagged.
    assert_eq!(plan.order.len(), 2);
    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.legs.len(), 1);
}

#[tokio::test]
async fn follow_up_refines_previous_results() {
    let store = support::sample_store();
    let vocabulary = Vocabulary::from_store(&store);
    let interpreter = QueryInterpreter::offline(2025);

    let first = interpreter
        .interpret("what's on Dec 20?", &vocabulary, reference())
        .await;
    let previous = store.query(&first.filter);
    assert_eq!(previous.len(), 3);

    let second = interpreter
        .interpret("only the free ones", &vocabulary, reference())
        .await;
    assert!(second.is_followup);
    let refined = store.refine(&previous, &second.filter);
    assert_eq!(refined.len(), 1);
    assert_eq!(store.get(refined[0]).unwrap().artist_line, "Vijay Siva");
}

#[tokio::test]
async fn unintelligible_text_still_searches_as_substring() {
    let store = support::sample_store();
    let vocabulary = Vocabulary::from_store(&store);
    let interpreter = QueryInterpreter::offline(2025);

    let interpretation = interpreter
        .interpret("Sanjay Subrahmanyan", &vocabulary, reference())
        .await;
    assert!(interpretation.degraded);
    let hits = store.query(&interpretation.filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(
        store.get(hits[0]).unwrap().artist_line,
        "Sanjay Subrahmanyan"
    );
}
