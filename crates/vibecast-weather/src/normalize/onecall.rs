use serde::Deserialize;
use serde_json::Value;

use super::{
    chronological, decode, first_condition, openweather_wind, OwCondition, FALLBACK_CURRENT,
    FALLBACK_FORECAST,
};
use crate::error::FetchError;
use crate::types::{
    CurrentConditions, DailyEntry, HourlyEntry, SourceTag, UnitSystem, WeatherBundle,
};

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    timezone: Option<String>,
    current: OneCallCurrent,
    #[serde(default)]
    hourly: Vec<OneCallHour>,
    #[serde(default)]
    daily: Vec<OneCallDay>,
}

#[derive(Debug, Deserialize)]
struct OneCallCurrent {
    dt: i64,
    temp: f64,
    feels_like: Option<f64>,
    wind_speed: Option<f64>,
    wind_deg: Option<f64>,
    uvi: Option<f64>,
    clouds: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallHour {
    dt: Option<i64>,
    temp: Option<f64>,
    pop: Option<f64>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallDay {
    dt: Option<i64>,
    temp: Option<OneCallDayTemp>,
    pop: Option<f64>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
    uvi: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OneCallDayTemp {
    min: Option<f64>,
    max: Option<f64>,
}

/// Map an OpenWeather One Call 3.0 payload. Requires `current.dt` and `current.temp`.
pub fn onecall(raw: Value, units: UnitSystem) -> Result<WeatherBundle, FetchError> {
    let resp: OneCallResponse = decode(raw, "One Call")?;
    let cur = resp.current;

    let current = CurrentConditions {
        timestamp: cur.dt,
        temp_value: cur.temp,
        feels_like_value: cur.feels_like.unwrap_or(cur.temp),
        wind_speed_value: openweather_wind(cur.wind_speed.unwrap_or(0.0), units),
        wind_direction_degrees: cur.wind_deg,
        uv_index: cur.uvi,
        cloud_cover_percent: cur.clouds.unwrap_or(0.0),
        humidity_percent: cur.humidity,
        pressure_hpa: cur.pressure,
        condition: first_condition(&cur.weather, FALLBACK_CURRENT),
    };

    let hourly = resp
        .hourly
        .into_iter()
        .filter_map(|h| {
            Some(HourlyEntry {
                timestamp: h.dt?,
                temp_value: h.temp?,
                precip_probability: h.pop,
                condition: first_condition(&h.weather, FALLBACK_FORECAST),
            })
        })
        .collect();

    let daily = resp
        .daily
        .into_iter()
        .filter_map(|d| {
            let temp = d.temp?;
            Some(DailyEntry {
                timestamp: d.dt?,
                temp_min: temp.min?,
                temp_max: temp.max?,
                precip_probability: d.pop,
                condition: first_condition(&d.weather, FALLBACK_FORECAST),
                sunrise: d.sunrise,
                sunset: d.sunset,
                uv_index_max: d.uvi,
                humidity_percent: d.humidity,
                pressure_hpa: d.pressure,
            })
        })
        .collect();

    let mut daily = chronological(daily, |d: &DailyEntry| d.timestamp);
    daily.truncate(super::DAILY_LIMIT);

    Ok(WeatherBundle {
        timezone_label: resp
            .timezone
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| "UTC".to_string()),
        current,
        hourly: chronological(hourly, |h: &HourlyEntry| h.timestamp),
        daily,
        source_tag: SourceTag::LiveProviderA,
        units,
    })
}
