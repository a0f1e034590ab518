//! Startup and refresh flow: show the cached snapshot immediately, then
//! replace it with live data once coordinates are known.
//!
//! State is published through a [`tokio::sync::watch`] channel. Only one live
//! fetch runs at a time; a second request while one is in flight is rejected
//! with [`RefreshOutcome::AlreadyRunning`].

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use vibecast_core::DefaultLocation;

use crate::cache::{CachedSnapshot, WeatherCache};
use crate::location::LocationSource;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, SourceTag, UnitSystem, WeatherBundle};

const GEOLOCATION_LABEL: &str = "Your City";
const LAST_KNOWN_LABEL: &str = "Saved Location";
const EXPLICIT_LABEL: &str = "Selected Location";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    HydratingFromCache,
    HydratingFromLive,
    Ready,
}

/// How the coordinates of the current fetch were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Geolocation,
    LastKnown,
    Default,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HydrationState {
    pub phase: Phase,
    pub bundle: Option<WeatherBundle>,
    pub last_updated: Option<DateTime<Utc>>,
    /// User-facing message from the last failed live fetch
    pub error: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub coordinate_source: Option<CoordinateSource>,
    pub place_label: Option<String>,
    pub units: UnitSystem,
}

impl HydrationState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::HydratingFromCache | Phase::HydratingFromLive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated(SourceTag),
    Failed,
    AlreadyRunning,
}

/// Clears the busy flag on drop
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Hydrator<L: LocationSource> {
    provider: WeatherProvider,
    cache: WeatherCache,
    location: L,
    default_location: DefaultLocation,
    state: watch::Sender<HydrationState>,
    busy: AtomicBool,
}

impl<L: LocationSource> Hydrator<L> {
    pub fn new(
        provider: WeatherProvider,
        cache: WeatherCache,
        location: L,
        default_location: DefaultLocation,
        units: UnitSystem,
    ) -> Self {
        let (state, _) = watch::channel(HydrationState {
            units,
            ..HydrationState::default()
        });
        Self {
            provider,
            cache,
            location,
            default_location,
            state,
            busy: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HydrationState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> HydrationState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Unit system for later fetches. The displayed bundle keeps its own units.
    pub fn set_units(&self, units: UnitSystem) {
        self.state.send_modify(|s| s.units = units);
    }

    /// Publish the cached snapshot as soon as it is read, resolve coordinates
    /// alongside, then fetch live
    pub async fn start(&self) -> RefreshOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return RefreshOutcome::AlreadyRunning;
        };

        self.state.send_modify(|s| s.phase = Phase::HydratingFromCache);
        let show_cached = async {
            if let Some(snapshot) = self.load_snapshot().await {
                self.publish_snapshot(snapshot);
            }
        };
        let ((), (coords, source)) = tokio::join!(show_cached, self.resolve_from_device());

        self.fetch_live(coords, source, None).await
    }

    /// Re-fetch for the last saved location, or the device location when
    /// nothing has been saved yet
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return RefreshOutcome::AlreadyRunning;
        };

        let (coords, source) = match self.load_coords().await {
            Some(coords) => (coords, CoordinateSource::LastKnown),
            None => self.resolve_from_device().await,
        };
        self.fetch_live(coords, source, None).await
    }

    /// Fetch for an explicitly chosen place, e.g. a city search result
    pub async fn show_location(&self, coords: Coordinates, name: Option<String>) -> RefreshOutcome {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            return RefreshOutcome::AlreadyRunning;
        };
        self.fetch_live(coords, CoordinateSource::Explicit, name).await
    }

    fn publish_snapshot(&self, snapshot: CachedSnapshot) {
        tracing::info!(
            "Showing cached weather from {}",
            snapshot.bundle.source_tag.label()
        );
        let last_updated = snapshot.saved_at_utc();
        self.state.send_modify(|s| {
            s.place_label = s.place_label.take().or_else(|| snapshot.bundle.city_label());
            s.bundle = Some(snapshot.bundle);
            s.last_updated = last_updated;
            s.phase = Phase::Ready;
        });
    }

    /// Run a store operation off the async workers. `None` if the task died.
    async fn with_cache<T, F>(&self, op: F) -> Option<T>
    where
        F: FnOnce(&WeatherCache) -> T + Send + 'static,
        T: Send + 'static,
    {
        let cache = self.cache.clone();
        match tokio::task::spawn_blocking(move || op(&cache)).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Cache task failed: {}", e);
                None
            }
        }
    }

    async fn load_snapshot(&self) -> Option<CachedSnapshot> {
        self.with_cache(|cache| cache.load_weather()).await.flatten()
    }

    async fn load_coords(&self) -> Option<Coordinates> {
        self.with_cache(|cache| cache.load_coords()).await.flatten()
    }

    /// Geolocation, then the last saved coordinate, then the configured default
    async fn resolve_from_device(&self) -> (Coordinates, CoordinateSource) {
        match self.location.current_location().await {
            Ok(coords) => return (coords, CoordinateSource::Geolocation),
            Err(e) => tracing::info!("Geolocation unavailable: {}", e),
        }
        if let Some(coords) = self.load_coords().await {
            return (coords, CoordinateSource::LastKnown);
        }
        let d = &self.default_location;
        tracing::info!("Using default location {}", d.name);
        (Coordinates::new(d.lat, d.lon), CoordinateSource::Default)
    }

    async fn fetch_live(
        &self,
        coords: Coordinates,
        source: CoordinateSource,
        name: Option<String>,
    ) -> RefreshOutcome {
        let units = self.state.borrow().units;
        self.state.send_modify(|s| {
            s.phase = Phase::HydratingFromLive;
            s.coordinates = Some(coords);
            s.coordinate_source = Some(source);
        });

        match self.provider.fetch_weather(coords, units).await {
            Ok(bundle) => {
                let snapshot = bundle.clone();
                let saved_at = self
                    .with_cache(move |cache| {
                        let at = cache.save_weather(&snapshot);
                        cache.save_coords(coords);
                        at
                    })
                    .await
                    .unwrap_or_else(Utc::now);

                let tag = bundle.source_tag;
                let label = self.place_label(name, &bundle, source);
                self.state.send_modify(|s| {
                    s.bundle = Some(bundle);
                    s.last_updated = Some(saved_at);
                    s.error = None;
                    s.place_label = Some(label);
                    s.phase = Phase::Ready;
                });
                RefreshOutcome::Updated(tag)
            }
            Err(e) => {
                tracing::warn!("Live weather failed for {}: {}", coords, e);
                let message = e.user_message().to_string();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.phase = Phase::Ready;
                });
                RefreshOutcome::Failed
            }
        }
    }

    fn place_label(
        &self,
        name: Option<String>,
        bundle: &WeatherBundle,
        source: CoordinateSource,
    ) -> String {
        name.filter(|n| !n.trim().is_empty())
            .or_else(|| bundle.city_label())
            .unwrap_or_else(|| match source {
                CoordinateSource::Geolocation => GEOLOCATION_LABEL.to_string(),
                CoordinateSource::LastKnown => LAST_KNOWN_LABEL.to_string(),
                CoordinateSource::Default => self.default_location.name.clone(),
                CoordinateSource::Explicit => EXPLICIT_LABEL.to_string(),
            })
    }
}
