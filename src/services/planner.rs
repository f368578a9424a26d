//! Itinerary planning over a selection of concerts.
//!
//! The planner flags time conflicts in the selection (advisory, nothing is
//! removed), resolves venues to coordinates through the geocoder, orders the
//! visits for travel, and prices the legs through the directions
//! collaborator. Every external failure degrades: an unresolvable venue
//! keeps its chronological position, an unavailable routing service falls
//! back to straight-line estimates.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use super::directions::{self, DirectionsProvider};
use super::geocoding::{normalize_venue, GeocodeError, VenueGeocoder};
use crate::algorithms::conflicts::{self, Conflict};
use crate::algorithms::routing::{self, Visit};
use crate::config::RoutingSettings;
use crate::models::{ConcertId, ConcertRecord, GeoPoint, RouteLeg, RoutePlan, TravelMode};
use crate::store::ScheduleStore;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("concert {0} is not part of the loaded schedule")]
    UnknownConcert(ConcertId),
}

pub struct ItineraryPlanner {
    geocoder: Arc<VenueGeocoder>,
    directions: Option<Arc<dyn DirectionsProvider>>,
    assumed_concert_minutes: i64,
    speeds: [f64; 3],
}

impl ItineraryPlanner {
    pub fn new(geocoder: Arc<VenueGeocoder>) -> Self {
        Self {
            geocoder,
            directions: None,
            assumed_concert_minutes: 120,
            speeds: [
                TravelMode::Driving.fallback_speed_kmh(),
                TravelMode::Transit.fallback_speed_kmh(),
                TravelMode::Walking.fallback_speed_kmh(),
            ],
        }
    }

    pub fn with_directions(mut self, provider: Arc<dyn DirectionsProvider>) -> Self {
        self.directions = Some(provider);
        self
    }

    pub fn with_routing_settings(mut self, settings: &RoutingSettings) -> Self {
        self.assumed_concert_minutes = settings.assumed_concert_minutes;
        self.speeds = [
            settings.driving_speed_kmh,
            settings.transit_speed_kmh,
            settings.walking_speed_kmh,
        ];
        self
    }

    fn speed_kmh(&self, mode: TravelMode) -> f64 {
        match mode {
            TravelMode::Driving => self.speeds[0],
            TravelMode::Transit => self.speeds[1],
            TravelMode::Walking => self.speeds[2],
        }
    }

    /// Flag overlapping pairs in the selection.
    pub fn detect_conflicts(
        &self,
        store: &ScheduleStore,
        selection: &[ConcertId],
    ) -> Result<Vec<Conflict>, PlanError> {
        let records = resolve_selection(store, selection)?;
        Ok(conflicts::find_conflicts(
            &records,
            self.assumed_concert_minutes,
        ))
    }

    /// Plan a travel route over the selection.
    ///
    /// The visit order groups by date and runs nearest-neighbour within each
    /// date, seeded from the earliest concert; ordering distances are
    /// straight-line so planning is deterministic and needs no network. Leg
    /// durations come from the directions collaborator when one is attached,
    /// with the straight-line estimate as the degraded mode.
    pub async fn plan_route(
        &self,
        store: &ScheduleStore,
        selection: &[ConcertId],
        mode: TravelMode,
    ) -> Result<RoutePlan, PlanError> {
        let records = resolve_selection(store, selection)?;
        let mut warnings = Vec::new();

        let conflicts = conflicts::find_conflicts(&records, self.assumed_concert_minutes);
        let by_id: HashMap<ConcertId, &ConcertRecord> =
            records.iter().map(|r| (r.id, *r)).collect();
        for conflict in &conflicts {
            if let (Some(a), Some(b)) = (by_id.get(&conflict.first), by_id.get(&conflict.second))
            {
                warnings.push(format!(
                    "time conflict: {} at {} may overlap with {} at {}",
                    a.artist_line, a.venue, b.artist_line, b.venue
                ));
            }
        }

        let points = self.resolve_venues(&records, &mut warnings).await;

        let visits: Vec<Visit> = records
            .iter()
            .map(|record| Visit {
                id: record.id,
                date: record.date,
                start: record.time.start(),
                point: points
                    .get(&normalize_venue(&record.venue))
                    .copied()
                    .flatten(),
            })
            .collect();
        let speed = self.speed_kmh(mode);
        let order = routing::order_visits(&visits, |a, b| {
            routing::straight_line_minutes(a, b, speed)
        });

        let mut legs = Vec::new();
        let mut total_distance_km = 0.0;
        let mut total_duration_min = 0.0;
        for pair in order.windows(2) {
            let (Some(from), Some(to)) = (by_id.get(&pair[0]), by_id.get(&pair[1])) else {
                continue;
            };
            let from_point = points.get(&normalize_venue(&from.venue)).copied().flatten();
            let to_point = points.get(&normalize_venue(&to.venue)).copied().flatten();
            let (Some(from_point), Some(to_point)) = (from_point, to_point) else {
                warnings.push(format!(
                    "travel from {} to {} not estimated: venue coordinate unknown",
                    from.venue, to.venue
                ));
                continue;
            };
            // Back-to-back slots at the same coordinates need no leg.
            if from_point.same_place(&to_point) {
                continue;
            }

            let (estimate, estimated) = match &self.directions {
                Some(provider) => match provider.travel(from_point, to_point, mode).await {
                    Ok(estimate) => (estimate, false),
                    Err(err) => {
                        warn!(%err, from = %from.venue, to = %to.venue,
                            "routing unavailable; using straight-line estimate");
                        (
                            directions::straight_line_estimate(from_point, to_point, speed),
                            true,
                        )
                    }
                },
                None => (
                    directions::straight_line_estimate(from_point, to_point, speed),
                    true,
                ),
            };

            if from.date == to.date {
                if let (Some(end), Some(next_start)) = (
                    from.end_datetime(self.assumed_concert_minutes),
                    to.start_datetime(),
                ) {
                    let gap_min = (next_start - end).num_minutes() as f64;
                    if gap_min < estimate.duration_min {
                        warnings.push(format!(
                            "tight transfer: {:.0} min between {} and {}, travel needs about {:.0} min",
                            gap_min.max(0.0),
                            from.venue,
                            to.venue,
                            estimate.duration_min
                        ));
                    }
                }
            }

            total_distance_km += estimate.distance_km;
            total_duration_min += estimate.duration_min;
            legs.push(RouteLeg {
                from: from.venue.clone(),
                to: to.venue.clone(),
                distance_km: estimate.distance_km,
                duration_min: estimate.duration_min,
                estimated,
            });
        }

        Ok(RoutePlan {
            order,
            legs,
            total_distance_km,
            total_duration_min,
            conflicts,
            warnings,
        })
    }

    /// Resolve each distinct venue once. A miss or a service failure leaves
    /// the venue without a coordinate and records a warning; it is never an
    /// error at this level.
    async fn resolve_venues(
        &self,
        records: &[&ConcertRecord],
        warnings: &mut Vec<String>,
    ) -> HashMap<String, Option<GeoPoint>> {
        let mut points: HashMap<String, Option<GeoPoint>> = HashMap::new();
        for record in records {
            let key = normalize_venue(&record.venue);
            if points.contains_key(&key) {
                continue;
            }
            let point = match self.geocoder.locate(&record.venue).await {
                Ok(point) => Some(point),
                Err(GeocodeError::Miss(_)) => {
                    warnings.push(format!(
                        "no coordinate for {}; it keeps its chronological slot",
                        record.venue
                    ));
                    None
                }
                Err(err) => {
                    warn!(%err, venue = %record.venue, "geocoding failed");
                    warnings.push(format!(
                        "no coordinate for {}; it keeps its chronological slot",
                        record.venue
                    ));
                    None
                }
            };
            points.insert(key, point);
        }
        points
    }
}

fn resolve_selection<'a>(
    store: &'a ScheduleStore,
    selection: &[ConcertId],
) -> Result<Vec<&'a ConcertRecord>, PlanError> {
    selection
        .iter()
        .map(|id| store.get(*id).ok_or(PlanError::UnknownConcert(*id)))
        .collect()
}
