//! Geocoding and directions API client.
//!
//! One client for both mapping collaborators: place lookup and leg routing
//! against Google-style `geocode`/`directions` JSON endpoints. One attempt
//! per call; the degraded modes live in the callers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::directions::{DirectionsProvider, RouteUnavailableError, TravelEstimate};
use super::geocoding::{GeocodeError, GeocodeProvider, ResolvedPlace};
use crate::models::{GeoPoint, TravelMode};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MapsError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error {0}: {1}")]
    Api(u16, String),
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: ValueField,
    duration: ValueField,
}

/// Metric value as the API reports it: metres for distance, seconds for
/// duration.
#[derive(Debug, Deserialize)]
struct ValueField {
    value: f64,
}

pub struct MapsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MapsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, MapsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MapsError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn geocode_raw(&self, address: &str) -> Result<GeocodeResponse, MapsError> {
        let url = format!("{}/geocode/json", self.base_url);
        debug!(address, "querying geocoding API");
        let response = self
            .http
            .get(&url)
            .query(&[("address", address), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| MapsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MapsError::Api(status.as_u16(), body));
        }
        response
            .json()
            .await
            .map_err(|e| MapsError::Network(e.to_string()))
    }
}

#[async_trait]
impl GeocodeProvider for MapsClient {
    async fn resolve(&self, query: &str) -> Result<Option<ResolvedPlace>, GeocodeError> {
        let reply = self
            .geocode_raw(query)
            .await
            .map_err(|e| GeocodeError::Service(e.to_string()))?;
        match reply.status.as_str() {
            "OK" => Ok(reply.results.into_iter().next().map(|result| ResolvedPlace {
                point: GeoPoint::new(result.geometry.location.lat, result.geometry.location.lng),
                address: result.formatted_address,
            })),
            "ZERO_RESULTS" => Ok(None),
            other => Err(GeocodeError::Service(format!("geocoding status {other}"))),
        }
    }
}

#[async_trait]
impl DirectionsProvider for MapsClient {
    async fn travel(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<TravelEstimate, RouteUnavailableError> {
        let url = format!("{}/directions/json", self.base_url);
        let origin = format!("{},{}", from.lat, from.lon);
        let destination = format!("{},{}", to.lat, to.lon);
        debug!(%from, %to, mode = mode.as_str(), "querying directions API");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("mode", mode.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RouteUnavailableError::Service(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteUnavailableError::Service(format!(
                "API error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let reply: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| RouteUnavailableError::Service(e.to_string()))?;
        match reply.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(RouteUnavailableError::NoRoute { from, to }),
            other => {
                return Err(RouteUnavailableError::Service(format!(
                    "directions status {other}"
                )))
            }
        }

        let leg = reply
            .routes
            .first()
            .and_then(|route| route.legs.first())
            .ok_or(RouteUnavailableError::NoRoute { from, to })?;
        Ok(TravelEstimate {
            distance_km: leg.distance.value / 1000.0,
            duration_min: leg.duration.value / 60.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_reply_decodes() {
        let raw = r#"{
            "status": "OK",
            "results": [{
                "formatted_address": "TTK Road, Chennai, Tamil Nadu, India",
                "geometry": { "location": { "lat": 13.0335, "lng": 80.2697 } }
            }]
        }"#;
        let reply: GeocodeResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(reply.status, "OK");
        assert_eq!(reply.results[0].geometry.location.lat, 13.0335);
    }

    #[test]
    fn test_directions_reply_decodes_metres_and_seconds() {
        let raw = r#"{
            "status": "OK",
            "routes": [{
                "legs": [{
                    "distance": { "value": 4200.0 },
                    "duration": { "value": 900.0 }
                }]
            }]
        }"#;
        let reply: DirectionsResponse = serde_json::from_str(raw).unwrap();
        let leg = &reply.routes[0].legs[0];
        assert_eq!(leg.distance.value / 1000.0, 4.2);
        assert_eq!(leg.duration.value / 60.0, 15.0);
    }
}
