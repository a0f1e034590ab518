//! Last-known weather and location, persisted for offline startup.
//!
//! Both slots are best effort: a write failure is logged and dropped, and
//! anything unreadable comes back as a miss.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::types::{Coordinates, WeatherBundle};

pub const WEATHER_KEY: &str = "vibecast.weather.last";
pub const COORDS_KEY: &str = "vibecast.coords.last";

/// Snapshot format written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// The last successfully fetched bundle and when it was saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    #[serde(default)]
    pub version: u32,
    pub bundle: WeatherBundle,
    /// Unix milliseconds
    pub saved_at: i64,
}

impl CachedSnapshot {
    pub fn saved_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.saved_at).single()
    }
}

#[derive(Clone)]
pub struct WeatherCache {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for WeatherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherCache").finish_non_exhaustive()
    }
}

impl WeatherCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// File-backed cache rooted at `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(Arc::new(FileStore::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Persist the bundle, returning the save time that was recorded
    pub fn save_weather(&self, bundle: &WeatherBundle) -> DateTime<Utc> {
        let now = Utc::now();
        let snapshot = CachedSnapshot {
            version: SNAPSHOT_VERSION,
            bundle: bundle.clone(),
            saved_at: now.timestamp_millis(),
        };
        if let Err(e) = self.write(WEATHER_KEY, &snapshot) {
            tracing::warn!("Failed to cache weather: {}", e);
        }
        now
    }

    pub fn load_weather(&self) -> Option<CachedSnapshot> {
        let snapshot: CachedSnapshot = self.read(WEATHER_KEY)?;
        if snapshot.version > SNAPSHOT_VERSION {
            tracing::debug!(
                "Ignoring cached weather from newer format v{}",
                snapshot.version
            );
            return None;
        }
        Some(snapshot)
    }

    pub fn save_coords(&self, coords: Coordinates) {
        if let Err(e) = self.write(COORDS_KEY, &coords) {
            tracing::warn!("Failed to cache coordinates: {}", e);
        }
    }

    pub fn load_coords(&self) -> Option<Coordinates> {
        let coords: Coordinates = self.read(COORDS_KEY)?;
        if !coords.is_valid() {
            tracing::debug!("Ignoring out-of-range cached coordinates {}", coords);
            return None;
        }
        Some(coords)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {}: {}", key, e);
                None
            }
        }
    }
}
