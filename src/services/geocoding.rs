//! Venue geocoding with a persisted coordinate cache.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::GeoPoint;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The venue has no resolvable coordinate. Recoverable: the venue stays
    /// visible in results and is simply left out of route optimization.
    #[error("venue '{0}' could not be resolved to a coordinate")]
    Miss(String),
    #[error("geocoding service error: {0}")]
    Service(String),
}

/// A place resolved by the geocoding collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub point: GeoPoint,
    pub address: Option<String>,
}

/// Name → coordinate collaborator. One attempt per call; `Ok(None)` when the
/// service answers but has no match for the query.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Option<ResolvedPlace>, GeocodeError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    lat: f64,
    lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
}

/// Venue-name → coordinate lookup in front of the geocoding collaborator.
///
/// Resolved coordinates are cached under the normalized venue name and
/// persisted to a JSON file, read at startup and appended to as new venues
/// resolve. Entries never expire; inserts are idempotent, so a venue always
/// keeps the coordinate it first resolved to.
pub struct VenueGeocoder {
    provider: Option<Arc<dyn GeocodeProvider>>,
    city: String,
    cache_path: Option<PathBuf>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl VenueGeocoder {
    pub fn new(provider: Option<Arc<dyn GeocodeProvider>>, city: impl Into<String>) -> Self {
        Self {
            provider,
            city: city.into(),
            cache_path: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Attach the persisted cache file, loading whatever it already holds.
    /// An unreadable or corrupt cache is logged and treated as empty.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let existing = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CacheEntry>>(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), %err, "venue cache unreadable; starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(path = %path.display(), entries = existing.len(), "venue cache loaded");
        self.cache = RwLock::new(existing);
        self.cache_path = Some(path);
        self
    }

    /// Resolve a venue name to a coordinate.
    ///
    /// Cache hits never touch the network. On a miss the collaborator is
    /// queried with city context first ("Vani Mahal, Chennai, India"), then
    /// with the bare name, matching how the venues are actually listed.
    pub async fn locate(&self, venue: &str) -> Result<GeoPoint, GeocodeError> {
        let key = normalize_venue(venue);
        if let Some(entry) = self.cache.read().get(&key) {
            return Ok(GeoPoint::new(entry.lat, entry.lon));
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| GeocodeError::Miss(venue.to_string()))?;

        let with_city = format!("{venue}, {}", self.city);
        let place = match provider.resolve(&with_city).await? {
            Some(place) => Some(place),
            None => provider.resolve(venue).await?,
        };
        let Some(place) = place else {
            debug!(venue, "geocoder has no match");
            return Err(GeocodeError::Miss(venue.to_string()));
        };

        self.remember(key, &place);
        Ok(place.point)
    }

    /// Coordinate from the cache only; no network.
    pub fn cached_point(&self, venue: &str) -> Option<GeoPoint> {
        self.cache
            .read()
            .get(&normalize_venue(venue))
            .map(|entry| GeoPoint::new(entry.lat, entry.lon))
    }

    /// Formatted address from the cache, when the collaborator supplied one.
    pub fn cached_address(&self, venue: &str) -> Option<String> {
        self.cache
            .read()
            .get(&normalize_venue(venue))
            .and_then(|entry| entry.address.clone())
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().len()
    }

    fn remember(&self, key: String, place: &ResolvedPlace) {
        {
            let mut cache = self.cache.write();
            // First resolution wins; concurrent writers converge.
            cache.entry(key).or_insert_with(|| CacheEntry {
                lat: place.point.lat,
                lon: place.point.lon,
                address: place.address.clone(),
            });
        }
        if let Err(err) = self.persist() {
            warn!(%err, "could not persist venue cache");
        }
    }

    /// Rewrite the cache file atomically: temp file then rename.
    fn persist(&self) -> std::io::Result<()> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        let serialized = {
            let cache = self.cache.read();
            serde_json::to_string_pretty(&*cache)?
        };
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(&tmp, path)
    }
}

/// Cache key: trimmed, lowercased, internal whitespace collapsed.
pub fn normalize_venue(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
