//! Route ordering and distance primitives.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::models::{ConcertId, GeoPoint};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Minutes to cover the straight-line distance at the given average speed.
pub fn straight_line_minutes(a: GeoPoint, b: GeoPoint, speed_kmh: f64) -> f64 {
    haversine_km(a, b) / speed_kmh * 60.0
}

/// A selected concert as the route orderer sees it.
#[derive(Debug, Clone)]
pub struct Visit {
    pub id: ConcertId,
    pub date: NaiveDate,
    pub start: Option<NaiveTime>,
    pub point: Option<GeoPoint>,
}

/// Order visits for travel.
///
/// Visits are grouped by date, since cross-day travel is irrelevant to the
/// ordering. A date group where every visit carries a coordinate is ordered
/// by a nearest-neighbour walk seeded from the earliest-starting concert: at
/// each step the unvisited concert with the smallest travel time from the
/// current venue is taken, ties falling to the chronologically earlier one.
/// A group with a single visit, or with any unresolved coordinate, keeps
/// chronological order. The walk is deterministic, so planning the same
/// selection twice yields the same order.
pub fn order_visits<F>(visits: &[Visit], mut travel_minutes: F) -> Vec<ConcertId>
where
    F: FnMut(GeoPoint, GeoPoint) -> f64,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<&Visit>> = BTreeMap::new();
    for visit in visits {
        by_date.entry(visit.date).or_default().push(visit);
    }

    let mut order = Vec::with_capacity(visits.len());
    for (_, mut group) in by_date {
        group.sort_by_key(|v| (v.start.is_none(), v.start, v.id));

        if group.len() < 2 || group.iter().any(|v| v.point.is_none()) {
            order.extend(group.iter().map(|v| v.id));
            continue;
        }

        let mut remaining: Vec<(ConcertId, GeoPoint)> = group
            .iter()
            .filter_map(|v| v.point.map(|p| (v.id, p)))
            .collect();

        let (seed_id, mut here) = remaining.remove(0);
        order.push(seed_id);
        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_cost = f64::INFINITY;
            for (i, (_, point)) in remaining.iter().enumerate() {
                let cost = travel_minutes(here, *point);
                // Strict comparison keeps the chronologically earlier
                // candidate on ties.
                if cost < best_cost {
                    best_cost = cost;
                    best = i;
                }
            }
            let (id, point) = remaining.remove(best);
            order.push(id);
            here = point;
        }
    }
    order
}
