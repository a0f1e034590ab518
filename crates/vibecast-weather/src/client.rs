//! HTTP clients for the upstream weather providers.
//!
//! Each fetcher returns the provider's raw JSON. Mapping into the canonical
//! bundle happens in [`crate::normalize`].

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::instrument;
use vibecast_core::EndpointConfig;

use crate::error::{FetchError, WeatherError};
use crate::types::{Coordinates, UnitSystem};

const ERROR_BODY_LIMIT: usize = 200;
const USER_AGENT: &str = concat!("vibecast/", env!("CARGO_PKG_VERSION"));

const OPEN_METEO_HOURLY: &str = "temperature_2m,precipitation_probability,cloudcover,windspeed_10m";
const OPEN_METEO_DAILY: &str = "temperature_2m_max,temperature_2m_min,precipitation_probability_max,sunrise,sunset,uv_index_max";

/// Shared HTTP plumbing for all providers
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    endpoints: EndpointConfig,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(endpoints: EndpointConfig, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(WeatherError::Client)?;

        Ok(Self {
            client,
            endpoints,
            timeout,
        })
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// OpenWeather One Call 3.0
    #[instrument(skip(self, api_key), level = "debug")]
    pub async fn fetch_onecall(
        &self,
        coords: Coordinates,
        units: UnitSystem,
        api_key: &str,
    ) -> Result<Value, FetchError> {
        let url = join_url(&self.endpoints.onecall_url, "onecall");
        let mut query = openweather_query(coords, units, api_key);
        query.push(("exclude", "minutely,alerts".to_string()));
        self.get_json(&url, &query).await
    }

    /// OpenWeather 2.5: current conditions, then the 3-hour forecast list.
    #[instrument(skip(self, api_key), level = "debug")]
    pub async fn fetch_openweather(
        &self,
        coords: Coordinates,
        units: UnitSystem,
        api_key: &str,
    ) -> Result<(Value, Value), FetchError> {
        let query = openweather_query(coords, units, api_key);
        let current = self
            .get_json(&join_url(&self.endpoints.openweather_url, "weather"), &query)
            .await?;
        let forecast = self
            .get_json(&join_url(&self.endpoints.openweather_url, "forecast"), &query)
            .await?;
        Ok((current, forecast))
    }

    /// Open-Meteo forecast, already converted to the requested units
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_open_meteo(
        &self,
        coords: Coordinates,
        units: UnitSystem,
    ) -> Result<Value, FetchError> {
        let (temperature_unit, windspeed_unit) = match units {
            UnitSystem::Metric => ("celsius", "kmh"),
            UnitSystem::Imperial => ("fahrenheit", "mph"),
        };
        let query = [
            ("latitude", coords.lat.to_string()),
            ("longitude", coords.lon.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", OPEN_METEO_HOURLY.to_string()),
            ("daily", OPEN_METEO_DAILY.to_string()),
            ("timezone", "auto".to_string()),
            ("temperature_unit", temperature_unit.to_string()),
            ("windspeed_unit", windspeed_unit.to_string()),
        ];
        self.get_json(&join_url(&self.endpoints.open_meteo_url, "forecast"), &query)
            .await
    }

    /// GET with the per-request timeout. Dropping the request future on
    /// timeout aborts the underlying connection.
    ///
    /// A 2xx body that is not JSON comes back as a JSON string so the
    /// mapper rejects it as a shape error.
    pub(crate) async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, FetchError> {
        match tokio::time::timeout(self.timeout, self.send(url, query)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        match serde_json::from_str(&body) {
            Ok(json) => Ok(json),
            Err(e) => {
                tracing::debug!("Response from {} is not JSON: {}", url, e);
                Ok(Value::String(body))
            }
        }
    }
}

fn openweather_query(coords: Coordinates, units: UnitSystem, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("lat", coords.lat.to_string()),
        ("lon", coords.lon.to_string()),
        ("appid", api_key.to_string()),
        ("units", units.as_str().to_string()),
    ]
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout_ms: u64) -> ProviderClient {
        let endpoints = EndpointConfig {
            onecall_url: server.uri(),
            openweather_url: server.uri(),
            open_meteo_url: server.uri(),
            geocoding_url: server.uri(),
            open_meteo_geocoding_url: server.uri(),
        };
        ProviderClient::new(endpoints, Duration::from_millis(timeout_ms)).unwrap()
    }

    #[test]
    fn test_join_url_trims_slash() {
        assert_eq!(join_url("http://x/v1/", "forecast"), "http://x/v1/forecast");
        assert_eq!(join_url("http://x/v1", "forecast"), "http://x/v1/forecast");
    }

    #[tokio::test]
    async fn test_open_meteo_query_uses_requested_units() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "43.65"))
            .and(query_param("longitude", "-79.38"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .and(query_param("windspeed_unit", "mph"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 2000);
        let json = client
            .fetch_open_meteo(Coordinates::new(43.65, -79.38), UnitSystem::Imperial)
            .await
            .unwrap();
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_onecall_query_excludes_minutely() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/onecall"))
            .and(query_param("appid", "k"))
            .and(query_param("units", "metric"))
            .and(query_param("exclude", "minutely,alerts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 2000);
        client
            .fetch_onecall(Coordinates::new(1.0, 2.0), UnitSystem::Metric, "k")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_string("x".repeat(500)))
            .mount(&server)
            .await;

        let client = client_for(&server, 2000);
        let err = client
            .fetch_openweather(Coordinates::new(1.0, 2.0), UnitSystem::Metric, "bad")
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body.len(), ERROR_BODY_LIMIT);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_falls_back_to_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, 2000);
        let json = client
            .fetch_open_meteo(Coordinates::new(1.0, 2.0), UnitSystem::Metric)
            .await
            .unwrap();
        assert_eq!(json, Value::String("<html>maintenance</html>".to_string()));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, 50);
        let err = client
            .fetch_open_meteo(Coordinates::new(1.0, 2.0), UnitSystem::Metric)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(50)));
    }
}
