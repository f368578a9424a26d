//! Route and travel types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::concert::ConcertId;
use crate::algorithms::conflicts::Conflict;

/// Geographic coordinate, WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Coordinate identity: venues resolved through the shared cache carry
    /// bit-identical coordinates, so exact comparison is the dedup key.
    pub fn same_place(&self, other: &GeoPoint) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lon)
    }
}

/// Travel mode for route legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Transit,
    Walking,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Walking => "walking",
        }
    }

    /// Average speed assumed when only a straight-line distance is known.
    pub fn fallback_speed_kmh(&self) -> f64 {
        match self {
            TravelMode::Driving => 30.0,
            TravelMode::Transit => 20.0,
            TravelMode::Walking => 5.0,
        }
    }
}

/// One travel segment between consecutive venues on the route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub duration_min: f64,
    /// True when the leg was estimated from straight-line distance because
    /// the routing service had no answer.
    pub estimated: bool,
}

/// Planned route over a selection of concerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Visit order over the selected concerts.
    pub order: Vec<ConcertId>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_km: f64,
    pub total_duration_min: f64,
    /// Overlapping pairs in the selection. Advisory; nothing is removed.
    pub conflicts: Vec<Conflict>,
    /// Human-readable notes: conflicts, tight transfers, unresolved venues.
    pub warnings: Vec<String>,
}
