//! Travel-time lookup between venue coordinates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::routing;
use crate::models::{GeoPoint, TravelMode};

/// Travel estimate for one leg.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub distance_km: f64,
    pub duration_min: f64,
}

/// Routing service failure for a required leg. Recoverable: the planner
/// falls back to straight-line estimation.
#[derive(Debug, Error)]
pub enum RouteUnavailableError {
    #[error("routing service error: {0}")]
    Service(String),
    #[error("no route from {from} to {to}")]
    NoRoute { from: GeoPoint, to: GeoPoint },
}

/// Duration/distance collaborator. One attempt per call.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn travel(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<TravelEstimate, RouteUnavailableError>;
}

/// Straight-line estimate used when the routing service has no answer:
/// haversine distance covered at the mode's assumed average speed.
pub fn straight_line_estimate(from: GeoPoint, to: GeoPoint, speed_kmh: f64) -> TravelEstimate {
    let distance_km = routing::haversine_km(from, to);
    TravelEstimate {
        distance_km,
        duration_min: distance_km / speed_kmh * 60.0,
    }
}
