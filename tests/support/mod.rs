//! Shared fixtures and collaborator fakes for the integration suite.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use margazhi_planner::algorithms::routing;
use margazhi_planner::models::{GeoPoint, TravelMode};
use margazhi_planner::services::directions::{
    DirectionsProvider, RouteUnavailableError, TravelEstimate,
};
use margazhi_planner::services::geocoding::{
    normalize_venue, GeocodeError, GeocodeProvider, ResolvedPlace, VenueGeocoder,
};
use margazhi_planner::services::interpreter::{IntentExtractor, IntentParseError, Vocabulary};
use margazhi_planner::ScheduleStore;

/// Opt-in log output for debugging a failing test run:
/// `RUST_LOG=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/margazhi_sample.tsv")
}

pub fn sample_store() -> ScheduleStore {
    ScheduleStore::load_path(&fixture_path()).expect("fixture schedule should load")
}

/// Geocoder fake backed by a fixed venue table.
pub struct FixedTableGeocoder {
    table: HashMap<String, GeoPoint>,
    pub calls: AtomicUsize,
}

impl FixedTableGeocoder {
    pub fn chennai_venues() -> Self {
        let mut table = HashMap::new();
        for (name, lat, lon) in [
            ("Music Academy", 13.0335, 80.2697),
            ("Narada Gana Sabha", 13.0418, 80.2525),
            ("Mylapore Fine Arts Club", 13.0284, 80.2630),
            ("Rasika Ranjani Sabha, Mylapore", 13.0336, 80.2680),
            ("Vani Mahal", 13.0410, 80.2337),
            ("Krishna Gana Sabha", 13.0402, 80.2402),
            ("Bharatiya Vidya Bhavan", 13.0303, 80.2660),
        ] {
            table.insert(normalize_venue(name), GeoPoint::new(lat, lon));
        }
        Self {
            table,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GeocodeProvider for FixedTableGeocoder {
    async fn resolve(&self, query: &str) -> Result<Option<ResolvedPlace>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let normalized = normalize_venue(query);
        let stripped = normalized
            .strip_suffix(", chennai, india")
            .unwrap_or(&normalized);
        Ok(self.table.get(stripped).map(|point| ResolvedPlace {
            point: *point,
            address: None,
        }))
    }
}

pub fn chennai_geocoder() -> Arc<VenueGeocoder> {
    Arc::new(VenueGeocoder::new(
        Some(Arc::new(FixedTableGeocoder::chennai_venues())),
        "Chennai, India",
    ))
}

/// Geocoder with no provider and no cache; every venue is a miss.
pub fn blind_geocoder() -> Arc<VenueGeocoder> {
    Arc::new(VenueGeocoder::new(None, "Chennai, India"))
}

/// Directions fake: road distance is straight-line scaled by a factor.
pub struct RoadFactorDirections {
    pub factor: f64,
}

#[async_trait]
impl DirectionsProvider for RoadFactorDirections {
    async fn travel(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<TravelEstimate, RouteUnavailableError> {
        let distance_km = routing::haversine_km(from, to) * self.factor;
        Ok(TravelEstimate {
            distance_km,
            duration_min: distance_km / mode.fallback_speed_kmh() * 60.0,
        })
    }
}

/// Directions fake that is always down.
pub struct DownDirections;

#[async_trait]
impl DirectionsProvider for DownDirections {
    async fn travel(
        &self,
        _from: GeoPoint,
        _to: GeoPoint,
        _mode: TravelMode,
    ) -> Result<TravelEstimate, RouteUnavailableError> {
        Err(RouteUnavailableError::Service(
            "connection refused".to_string(),
        ))
    }
}

/// Extractor fake returning a canned reply verbatim.
pub struct CannedExtractor {
    pub reply: String,
}

#[async_trait]
impl IntentExtractor for CannedExtractor {
    async fn extract(
        &self,
        _text: &str,
        _vocabulary: &Vocabulary,
    ) -> Result<String, IntentParseError> {
        Ok(self.reply.clone())
    }
}
