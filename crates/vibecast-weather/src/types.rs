use serde::{Deserialize, Serialize};

pub use vibecast_core::UnitSystem;

/// Geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Finite and within the geographic range
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}, {:.2}", self.lat, self.lon)
    }
}

/// Weather condition as reported (or synthesized) for one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: Option<String>,
}

impl Condition {
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            description: None,
        }
    }

    /// Empty descriptions are treated as absent
    pub fn with_description(main: impl Into<String>, description: Option<String>) -> Self {
        Self {
            main: main.into(),
            description: description.filter(|d| !d.trim().is_empty()),
        }
    }
}

/// Which provider produced a bundle. Display/debugging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceTag {
    LiveProviderA,
    LiveProviderB,
    LiveProviderC,
    Demo,
}

impl SourceTag {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LiveProviderA => "OpenWeather One Call",
            Self::LiveProviderB => "OpenWeather",
            Self::LiveProviderC => "Open-Meteo",
            Self::Demo => "demo",
        }
    }
}

/// Upstream providers, in fallback priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    /// OpenWeather One Call 3.0 (subscription)
    OneCall,
    /// OpenWeather 2.5 current + 3-hour forecast
    OpenWeather,
    /// Open-Meteo, keyless
    OpenMeteo,
}

impl ProviderId {
    pub const PRIORITY: [ProviderId; 3] = [Self::OneCall, Self::OpenWeather, Self::OpenMeteo];

    pub fn source_tag(&self) -> SourceTag {
        match self {
            Self::OneCall => SourceTag::LiveProviderA,
            Self::OpenWeather => SourceTag::LiveProviderB,
            Self::OpenMeteo => SourceTag::LiveProviderC,
        }
    }

    /// The last provider in the chain; its failure fails the whole fetch
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OpenMeteo)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source_tag().label())
    }
}

/// Current conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    /// Unix seconds
    pub timestamp: i64,
    pub temp_value: f64,
    pub feels_like_value: f64,
    pub wind_speed_value: f64,
    pub wind_direction_degrees: Option<f64>,
    pub uv_index: Option<f64>,
    pub cloud_cover_percent: f64,
    pub humidity_percent: Option<f64>,
    #[serde(rename = "pressureHPa")]
    pub pressure_hpa: Option<f64>,
    pub condition: Condition,
}

/// Hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyEntry {
    pub timestamp: i64,
    pub temp_value: f64,
    /// 0..1
    pub precip_probability: Option<f64>,
    pub condition: Condition,
}

/// Daily forecast entry. Sunrise, sunset and UV are often unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub timestamp: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub precip_probability: Option<f64>,
    pub condition: Condition,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub uv_index_max: Option<f64>,
    pub humidity_percent: Option<f64>,
    #[serde(rename = "pressureHPa")]
    pub pressure_hpa: Option<f64>,
}

/// Complete, provider-agnostic weather data bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherBundle {
    pub timezone_label: String,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub source_tag: SourceTag,
    /// Unit system the values were fetched in
    #[serde(default)]
    pub units: UnitSystem,
}

impl WeatherBundle {
    /// City name derived from the timezone label, e.g. "America/New_York" -> "New York"
    pub fn city_label(&self) -> Option<String> {
        let last = self.timezone_label.rsplit('/').next()?.trim();
        if last.is_empty() {
            return None;
        }
        Some(last.replace('_', " "))
    }

    pub fn today(&self) -> Option<&DailyEntry> {
        self.daily.first()
    }
}
