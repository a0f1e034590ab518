//! Weather pipeline for Vibecast
//!
//! Fetches live weather from OpenWeather (One Call 3.0 or 2.5) with Open-Meteo
//! as the keyless fallback, normalizes every response into one
//! [`WeatherBundle`], and keeps the last good result on disk so startup can
//! show something before the network answers.

pub mod cache;
pub mod client;
pub mod demo;
pub mod error;
pub mod geocode;
pub mod hydrate;
pub mod location;
pub mod normalize;
pub mod provider;
pub mod store;
pub mod theme;
pub mod types;
pub mod units;

pub use cache::{CachedSnapshot, WeatherCache};
pub use error::{FailureKind, FetchError, LocationError, StorageError, WeatherError};
pub use geocode::{GeocodeResult, Geocoder};
pub use hydrate::{CoordinateSource, HydrationState, Hydrator, Phase, RefreshOutcome};
pub use location::{FixedLocation, LocationSource, Unavailable};
pub use provider::{FetchSettings, WeatherProvider};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::*;
