use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the configured provider credential
pub const API_KEY_ENV: &str = "VIBECAST_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Unit system requested by the caller. Metric is °C and km/h, imperial is °F and mph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "celsius" | "c" => Ok(Self::Metric),
            "imperial" | "fahrenheit" | "f" => Ok(Self::Imperial),
            other => Err(format!("unknown unit system '{}', expected metric or imperial", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Unit system used for every fetch
    pub units: UnitSystem,

    /// OpenWeather API key. `VIBECAST_API_KEY` takes precedence when set.
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Use the One Call 3.0 endpoint (requires a subscription)
    pub enable_onecall: bool,

    /// Directory for the offline snapshot; defaults to `<config_dir>/cache`
    pub cache_dir: Option<PathBuf>,

    /// Used when no location has ever been recorded
    pub default_location: DefaultLocation,

    /// Upstream base URLs
    pub endpoints: EndpointConfig,
}

impl WeatherConfig {
    /// Effective credential: environment first, then the config file.
    /// Empty values and `YOUR_...` placeholders count as absent.
    pub fn credential(&self) -> Option<String> {
        pick_credential(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }
}

fn pick_credential(env: Option<String>, configured: Option<&str>) -> Option<String> {
    let usable = |s: &str| !s.trim().is_empty() && !s.starts_with("YOUR_");
    env.filter(|s| usable(s))
        .or_else(|| configured.filter(|s| usable(s)).map(str::to_string))
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            api_key: None,
            fetch_timeout_ms: 8000,
            enable_onecall: false,
            cache_dir: None,
            default_location: DefaultLocation::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            name: "Toronto".to_string(),
            lat: 43.65,
            lon: -79.38,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub onecall_url: String,
    pub openweather_url: String,
    pub open_meteo_url: String,
    pub geocoding_url: String,
    pub open_meteo_geocoding_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            onecall_url: "https://api.openweathermap.org/data/3.0".to_string(),
            openweather_url: "https://api.openweathermap.org/data/2.5".to_string(),
            open_meteo_url: "https://api.open-meteo.com/v1".to_string(),
            geocoding_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            open_meteo_geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vibecast")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating a default file there if missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_dir);

        if !path.exists() {
            let config = Self {
                config_dir,
                ..Self::default()
            };
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.config_dir = config_dir;
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Directory holding the offline weather snapshot
    pub fn cache_dir(&self) -> PathBuf {
        self.weather
            .cache_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("cache"))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let weather = &self.weather;

        let endpoints = [
            ("weather.endpoints.onecall_url", &weather.endpoints.onecall_url),
            ("weather.endpoints.openweather_url", &weather.endpoints.openweather_url),
            ("weather.endpoints.open_meteo_url", &weather.endpoints.open_meteo_url),
            ("weather.endpoints.geocoding_url", &weather.endpoints.geocoding_url),
            (
                "weather.endpoints.open_meteo_geocoding_url",
                &weather.endpoints.open_meteo_geocoding_url,
            ),
        ];
        for (field, url) in endpoints {
            validate_url(url, field, &mut result);
        }

        if weather.fetch_timeout_ms == 0 {
            result.add_error("weather.fetch_timeout_ms", "Timeout must be greater than 0");
        } else if weather.fetch_timeout_ms > 60_000 {
            result.add_warning(
                "weather.fetch_timeout_ms",
                "Timeout is more than a minute; a stalled provider will delay fallback",
            );
        }

        let loc = &weather.default_location;
        if !loc.lat.is_finite() || loc.lat.abs() > 90.0 {
            result.add_error("weather.default_location.lat", "Latitude must be within -90..90");
        }
        if !loc.lon.is_finite() || loc.lon.abs() > 180.0 {
            result.add_error("weather.default_location.lon", "Longitude must be within -180..180");
        }

        let has_key = pick_credential(None, weather.api_key.as_deref()).is_some()
            || std::env::var(API_KEY_ENV).is_ok();
        if !has_key {
            result.add_warning(
                "weather.api_key",
                "No OpenWeather key configured - only Open-Meteo will be used",
            );
        }
        if weather.enable_onecall && !has_key {
            result.add_warning(
                "weather.enable_onecall",
                "One Call is enabled but no API key is set; it will be skipped",
            );
        }

        result
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("vibecast").join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
