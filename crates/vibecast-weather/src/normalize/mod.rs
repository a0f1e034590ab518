//! Pure mappers from each provider's raw payload into a [`WeatherBundle`].
//!
//! Payloads are decoded through serde structs that only require the fields
//! a mapper cannot do without; a decode failure is a shape error, which the
//! orchestrator treats like any other provider failure.
//!
//! [`WeatherBundle`]: crate::types::WeatherBundle

mod onecall;
mod open_meteo;
mod openweather;

pub use onecall::onecall;
pub use open_meteo::open_meteo;
pub use openweather::openweather;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::types::{Condition, UnitSystem};
use crate::units::ms_to_kmh;

/// Hourly entries kept for the 3-hour and Open-Meteo feeds
pub const HOURLY_LIMIT: usize = 12;
/// Days kept in any bundle
pub const DAILY_LIMIT: usize = 7;

const FALLBACK_CURRENT: &str = "Clear";
const FALLBACK_FORECAST: &str = "Unknown";

/// OpenWeather `weather[]` element, shared by One Call and 2.5
#[derive(Debug, Deserialize)]
struct OwCondition {
    main: Option<String>,
    description: Option<String>,
}

fn decode<T: DeserializeOwned>(raw: Value, what: &str) -> Result<T, FetchError> {
    serde_json::from_value(raw).map_err(|e| FetchError::shape(format!("{}: {}", what, e)))
}

/// First element of an OpenWeather condition array
fn first_condition(conditions: &[OwCondition], fallback: &str) -> Condition {
    match conditions.first() {
        Some(c) => Condition::with_description(
            c.main.clone().unwrap_or_else(|| fallback.to_string()),
            c.description.clone(),
        ),
        None => Condition::new(fallback),
    }
}

/// OpenWeather reports m/s under `units=metric` and mph under `units=imperial`
fn openweather_wind(speed: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => ms_to_kmh(speed),
        UnitSystem::Imperial => speed,
    }
}

/// Stable sort by timestamp, keeping the first entry for a repeated timestamp
fn chronological<T>(mut items: Vec<T>, timestamp: impl Fn(&T) -> i64) -> Vec<T> {
    items.sort_by_key(|item| timestamp(item));
    items.dedup_by_key(|item| timestamp(&*item));
    items
}

/// Parse an ISO-8601 time. Strings without an offset are local to the
/// forecast location and shifted by `utc_offset_seconds`.
fn parse_local_timestamp(s: &str, utc_offset_seconds: i64) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(naive.and_utc().timestamp() - utc_offset_seconds)
}
