//! Provider fallback chain: One Call 3.0, then OpenWeather 2.5, then Open-Meteo.

use std::time::Duration;

use vibecast_core::{EndpointConfig, WeatherConfig};

use crate::client::ProviderClient;
use crate::error::{FetchError, WeatherError};
use crate::normalize;
use crate::types::{Coordinates, ProviderId, UnitSystem, WeatherBundle};

/// Everything a fetch needs besides the location and unit system
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_key: Option<String>,
    pub enable_onecall: bool,
    pub timeout: Duration,
    pub endpoints: EndpointConfig,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&WeatherConfig::default())
    }
}

impl From<&WeatherConfig> for FetchSettings {
    fn from(config: &WeatherConfig) -> Self {
        Self {
            api_key: config.credential(),
            enable_onecall: config.enable_onecall,
            timeout: Duration::from_millis(config.fetch_timeout_ms),
            endpoints: config.endpoints.clone(),
        }
    }
}

/// Fetches live weather, falling through providers in priority order
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: ProviderClient,
    settings: FetchSettings,
}

impl WeatherProvider {
    pub fn new(settings: FetchSettings) -> Result<Self, WeatherError> {
        let client = ProviderClient::new(settings.endpoints.clone(), settings.timeout)?;
        Ok(Self { client, settings })
    }

    fn api_key(&self) -> Option<&str> {
        self.settings.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Providers this configuration may try, in order
    pub fn eligible_providers(&self) -> Vec<ProviderId> {
        ProviderId::PRIORITY
            .into_iter()
            .filter(|p| match p {
                ProviderId::OneCall => self.settings.enable_onecall && self.api_key().is_some(),
                ProviderId::OpenWeather => self.api_key().is_some(),
                ProviderId::OpenMeteo => true,
            })
            .collect()
    }

    /// Try each eligible provider in turn. Only the terminal provider's
    /// failure is returned; earlier failures are logged and skipped.
    pub async fn fetch_weather(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherBundle, WeatherError> {
        for provider in self.eligible_providers() {
            match self.attempt(provider, coords, units).await {
                Ok(bundle) => {
                    tracing::info!("Weather loaded from {} for {}", provider, coords);
                    return Ok(bundle);
                }
                Err(source) if provider.is_terminal() => {
                    tracing::error!("{} failed: {}", provider, source);
                    return Err(WeatherError::Live { provider, source });
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed ({:?}), falling back: {}",
                        provider,
                        e.kind(),
                        e
                    );
                }
            }
        }

        // Open-Meteo is always eligible and terminal
        Err(WeatherError::Live {
            provider: ProviderId::OpenMeteo,
            source: FetchError::shape("no provider attempted"),
        })
    }

    async fn attempt(
        &self,
        provider: ProviderId,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<WeatherBundle, FetchError> {
        let key = self.api_key().unwrap_or_default();
        match provider {
            ProviderId::OneCall => {
                let raw = self.client.fetch_onecall(coords, units, key).await?;
                normalize::onecall(raw, units)
            }
            ProviderId::OpenWeather => {
                let (current, forecast) = self.client.fetch_openweather(coords, units, key).await?;
                normalize::openweather(current, forecast, units)
            }
            ProviderId::OpenMeteo => {
                let raw = self.client.fetch_open_meteo(coords, units).await?;
                normalize::open_meteo(raw, units)
            }
        }
    }
}
