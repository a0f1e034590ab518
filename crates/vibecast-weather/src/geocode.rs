//! Forward geocoding: city name to coordinates.
//! OpenWeather when a key is configured, Open-Meteo (no key) otherwise or as fallback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{join_url, ProviderClient};
use crate::error::WeatherError;
use crate::provider::FetchSettings;
use crate::types::Coordinates;

const RESULT_LIMIT: usize = 5;

/// One candidate place for a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: Option<String>,
    pub state: Option<String>,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// "Name, State, Country" with absent parts left out
    pub fn label(&self) -> String {
        [Some(&self.name), self.state.as_ref(), self.country.as_ref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct OpenWeatherPlace {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoSearch {
    #[serde(default)]
    results: Vec<OpenMeteoPlace>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: ProviderClient,
    api_key: Option<String>,
}

impl Geocoder {
    pub fn new(settings: &FetchSettings) -> Result<Self, WeatherError> {
        Ok(Self {
            client: ProviderClient::new(settings.endpoints.clone(), settings.timeout)?,
            api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    /// Up to five matches for `query`. Failures yield an empty list.
    pub async fn search(&self, query: &str) -> Vec<GeocodeResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        if let Some(key) = self.api_key.as_deref() {
            let results = self.search_openweather(query, key).await;
            if !results.is_empty() {
                return results;
            }
        }

        self.search_open_meteo(query).await
    }

    async fn search_openweather(&self, query: &str, key: &str) -> Vec<GeocodeResult> {
        let url = join_url(&self.client.endpoints().geocoding_url, "direct");
        let params = [
            ("q", query.to_string()),
            ("limit", RESULT_LIMIT.to_string()),
            ("appid", key.to_string()),
        ];

        let body = match self.client.get_json(&url, &params).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("OpenWeather geocoding failed: {}", e);
                return Vec::new();
            }
        };

        let Value::Array(items) = body else {
            tracing::debug!("OpenWeather geocoding returned a non-array body");
            return Vec::new();
        };

        items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<OpenWeatherPlace>(item).ok())
            .take(RESULT_LIMIT)
            .map(|p| GeocodeResult {
                name: p.name,
                lat: p.lat,
                lon: p.lon,
                country: p.country,
                state: p.state,
            })
            .collect()
    }

    async fn search_open_meteo(&self, query: &str) -> Vec<GeocodeResult> {
        let url = join_url(&self.client.endpoints().open_meteo_geocoding_url, "search");
        let params = [
            ("name", query.to_string()),
            ("count", RESULT_LIMIT.to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let body = match self.client.get_json(&url, &params).await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Open-Meteo geocoding failed: {}", e);
                return Vec::new();
            }
        };

        let search: OpenMeteoSearch = match serde_json::from_value(body) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!("Open-Meteo geocoding parse error: {}", e);
                return Vec::new();
            }
        };

        let results: Vec<GeocodeResult> = search
            .results
            .into_iter()
            .take(RESULT_LIMIT)
            .map(|p| GeocodeResult {
                name: p.name,
                lat: p.latitude,
                lon: p.longitude,
                country: p.country,
                state: p.admin1,
            })
            .collect();

        tracing::info!("Geocoded {:?} to {} result(s)", query, results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::time::Duration;
    use vibecast_core::EndpointConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer, api_key: Option<&str>) -> Geocoder {
        let settings = FetchSettings {
            api_key: api_key.map(String::from),
            enable_onecall: false,
            timeout: Duration::from_secs(2),
            endpoints: EndpointConfig {
                onecall_url: server.uri(),
                openweather_url: server.uri(),
                open_meteo_url: server.uri(),
                geocoding_url: server.uri(),
                open_meteo_geocoding_url: server.uri(),
            },
        };
        Geocoder::new(&settings).unwrap()
    }

    fn open_meteo_paris() -> serde_json::Value {
        serde_json::json!({
            "results": [{
                "name": "Paris",
                "latitude": 48.85,
                "longitude": 2.35,
                "country": "France",
                "admin1": "Île-de-France"
            }]
        })
    }

    #[test]
    fn test_label() {
        let r = GeocodeResult {
            name: "Springfield".into(),
            lat: 0.0,
            lon: 0.0,
            country: Some("US".into()),
            state: Some("".into()),
        };
        assert_eq!(r.label(), "Springfield, US");
    }

    #[tokio::test]
    async fn test_keyless_uses_open_meteo() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "5"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_paris()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let results = geocoder(&server, None).search("  Paris ").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].state.as_deref(), Some("Île-de-France"));
        assert_eq!(results[0].coordinates(), Coordinates::new(48.85, 2.35));
    }

    #[tokio::test]
    async fn test_openweather_with_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Toronto"))
            .and(query_param("limit", "5"))
            .and(query_param("appid", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Toronto", "lat": 43.65, "lon": -79.38, "country": "CA", "state": "Ontario"}
            ])))
            .mount(&server)
            .await;

        let results = geocoder(&server, Some("k")).search("Toronto").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label(), "Toronto, Ontario, CA");
    }

    #[tokio::test]
    async fn test_openweather_failure_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(open_meteo_paris()))
            .expect(1)
            .mount(&server)
            .await;

        let results = geocoder(&server, Some("bad")).search("Paris").await;
        assert_eq!(results[0].name, "Paris");
    }

    #[tokio::test]
    async fn test_failures_yield_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(geocoder(&server, Some("k")).search("Nowhere").await.is_empty());
        assert!(geocoder(&server, None).search("").await.is_empty());
    }

    #[tokio::test]
    async fn test_no_results_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"generationtime_ms": 0.2})))
            .mount(&server)
            .await;

        assert!(geocoder(&server, None).search("Atlantis").await.is_empty());
    }
}
