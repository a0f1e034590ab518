use serde::Deserialize;
use serde_json::Value;

use super::{chronological, decode, parse_local_timestamp, DAILY_LIMIT, HOURLY_LIMIT};
use crate::error::FetchError;
use crate::types::{
    Condition, CurrentConditions, DailyEntry, HourlyEntry, SourceTag, UnitSystem, WeatherBundle,
};

const RAIN_THRESHOLD: f64 = 40.0;
const CLOUD_THRESHOLD: f64 = 60.0;

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    timezone: Option<String>,
    #[serde(default)]
    utc_offset_seconds: i64,
    current_weather: Option<CurrentWeather>,
    #[serde(default)]
    hourly: HourlySeries,
    #[serde(default)]
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    time: Option<String>,
    temperature: Option<f64>,
    windspeed: Option<f64>,
    winddirection: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlySeries {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    #[serde(alias = "cloud_cover")]
    cloudcover: Vec<Option<f64>>,
    #[serde(alias = "wind_speed_10m")]
    windspeed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DailySeries {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
    uv_index_max: Vec<Option<f64>>,
}

/// One row of the hourly arrays
#[derive(Debug, Clone, Copy)]
struct Sample {
    timestamp: Option<i64>,
    temp: Option<f64>,
    pop: Option<f64>,
    cloud: Option<f64>,
    wind: Option<f64>,
}

fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

fn synthesize(pop: Option<f64>, cloud: Option<f64>) -> Condition {
    if pop.unwrap_or(0.0) > RAIN_THRESHOLD {
        Condition::new("Rain")
    } else if cloud.unwrap_or(0.0) > CLOUD_THRESHOLD {
        Condition::new("Clouds")
    } else {
        Condition::new("Clear")
    }
}

fn percent_to_fraction(p: Option<f64>) -> Option<f64> {
    p.map(|v| v / 100.0)
}

/// Map an Open-Meteo forecast. The payload is already in the requested units.
pub fn open_meteo(raw: Value, units: UnitSystem) -> Result<WeatherBundle, FetchError> {
    let resp: OpenMeteoResponse = decode(raw, "Open-Meteo")?;
    let offset = resp.utc_offset_seconds;
    let h = &resp.hourly;

    let samples: Vec<Sample> = h
        .time
        .iter()
        .enumerate()
        .map(|(i, t)| Sample {
            timestamp: parse_local_timestamp(t, offset),
            temp: at(&h.temperature_2m, i),
            pop: at(&h.precipitation_probability, i),
            cloud: at(&h.cloudcover, i),
            wind: at(&h.windspeed_10m, i),
        })
        .collect();

    let cw = resp.current_weather.as_ref();
    let observed_at = cw
        .and_then(|c| c.time.as_deref())
        .or_else(|| h.time.first().map(String::as_str))
        .and_then(|t| parse_local_timestamp(t, offset));
    let sample = observed_at
        .and_then(|ts| samples.iter().find(|s| s.timestamp == Some(ts)))
        .or_else(|| samples.first())
        .copied();

    let temp_value = cw
        .and_then(|c| c.temperature)
        .or_else(|| sample.and_then(|s| s.temp))
        .ok_or_else(|| FetchError::shape("Open-Meteo: no current temperature"))?;
    let timestamp = sample
        .and_then(|s| s.timestamp)
        .or(observed_at)
        .ok_or_else(|| FetchError::shape("Open-Meteo: no current time"))?;

    let current = CurrentConditions {
        timestamp,
        temp_value,
        feels_like_value: temp_value,
        wind_speed_value: cw
            .and_then(|c| c.windspeed)
            .or_else(|| sample.and_then(|s| s.wind))
            .unwrap_or(0.0),
        wind_direction_degrees: cw.and_then(|c| c.winddirection),
        uv_index: None,
        cloud_cover_percent: sample.and_then(|s| s.cloud).unwrap_or(0.0),
        humidity_percent: None,
        pressure_hpa: None,
        condition: synthesize(sample.and_then(|s| s.pop), sample.and_then(|s| s.cloud)),
    };

    let hourly = samples
        .iter()
        .filter_map(|s| {
            Some(HourlyEntry {
                timestamp: s.timestamp?,
                temp_value: s.temp?,
                precip_probability: percent_to_fraction(s.pop),
                condition: synthesize(s.pop, s.cloud),
            })
        })
        .collect();
    let mut hourly = chronological(hourly, |e: &HourlyEntry| e.timestamp);
    hourly.truncate(HOURLY_LIMIT);

    let d = &resp.daily;
    let daily = d
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, t)| {
            let pop = at(&d.precipitation_probability_max, i);
            let local_time = |series: &[Option<String>]| {
                series
                    .get(i)
                    .and_then(|s| s.as_deref())
                    .and_then(|s| parse_local_timestamp(s, offset))
            };
            Some(DailyEntry {
                timestamp: parse_local_timestamp(t, offset)?,
                temp_min: at(&d.temperature_2m_min, i)?,
                temp_max: at(&d.temperature_2m_max, i)?,
                precip_probability: percent_to_fraction(pop),
                condition: if pop.unwrap_or(0.0) > RAIN_THRESHOLD {
                    Condition::new("Rain")
                } else {
                    Condition::new("Clear")
                },
                sunrise: local_time(d.sunrise.as_slice()),
                sunset: local_time(d.sunset.as_slice()),
                uv_index_max: at(&d.uv_index_max, i),
                humidity_percent: None,
                pressure_hpa: None,
            })
        })
        .collect();
    let mut daily = chronological(daily, |e: &DailyEntry| e.timestamp);
    daily.truncate(DAILY_LIMIT);

    Ok(WeatherBundle {
        timezone_label: resp
            .timezone
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| "UTC".to_string()),
        current,
        hourly,
        daily,
        source_tag: SourceTag::LiveProviderC,
        units,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    // 2024-07-15T00:00:00Z
    const MIDNIGHT: i64 = 1_721_001_600;

    fn sample() -> Value {
        json!({
            "timezone": "America/Toronto",
            "utc_offset_seconds": -14400,
            "current_weather": {
                "time": "2024-07-15T01:00",
                "temperature": 21.4,
                "windspeed": 11.2,
                "winddirection": 250
            },
            "hourly": {
                "time": ["2024-07-15T00:00", "2024-07-15T01:00", "2024-07-15T02:00", "2024-07-15T03:00"],
                "temperature_2m": [22.0, 21.5, 20.9, null],
                "precipitation_probability": [10, 55, 20],
                "cloudcover": [20, 30, 75, 10],
                "windspeed_10m": [9.0, 10.0, 12.0, 8.0]
            },
            "daily": {
                "time": ["2024-07-15", "2024-07-16"],
                "temperature_2m_max": [27.0, 25.0],
                "temperature_2m_min": [18.0, 16.0],
                "precipitation_probability_max": [65, 5],
                "sunrise": ["2024-07-15T05:50", null],
                "sunset": ["2024-07-15T20:55"],
                "uv_index_max": [7.5, null]
            }
        })
    }

    #[test]
    fn test_current_matches_observation_time() {
        let bundle = open_meteo(sample(), UnitSystem::Metric).unwrap();
        let c = &bundle.current;
        assert_eq!(bundle.source_tag, SourceTag::LiveProviderC);
        assert_eq!(c.timestamp, MIDNIGHT + 5 * 3600);
        assert_eq!(c.temp_value, 21.4);
        assert_eq!(c.feels_like_value, 21.4);
        assert_eq!(c.wind_speed_value, 11.2);
        assert_eq!(c.wind_direction_degrees, Some(250.0));
        assert_eq!(c.cloud_cover_percent, 30.0);
        assert_eq!(c.condition.main, "Rain");
        assert_eq!(c.uv_index, None);
    }

    #[test]
    fn test_hourly_zip_tolerates_short_arrays() {
        let bundle = open_meteo(sample(), UnitSystem::Metric).unwrap();
        // last row has a null temperature and is dropped
        assert_eq!(bundle.hourly.len(), 3);
        assert_eq!(bundle.hourly[0].timestamp, MIDNIGHT + 4 * 3600);
        assert_eq!(bundle.hourly[0].precip_probability, Some(0.1));
        assert_eq!(bundle.hourly[0].condition.main, "Clear");
        assert_eq!(bundle.hourly[2].condition.main, "Clouds");
    }

    #[test]
    fn test_daily_mapping() {
        let bundle = open_meteo(sample(), UnitSystem::Metric).unwrap();
        let today = &bundle.daily[0];
        assert_eq!(today.timestamp, MIDNIGHT + 4 * 3600);
        assert_eq!(today.condition.main, "Rain");
        assert_eq!(today.precip_probability, Some(0.65));
        assert_eq!(today.sunrise, Some(MIDNIGHT + 9 * 3600 + 50 * 60));
        assert_eq!(today.uv_index_max, Some(7.5));

        let tomorrow = &bundle.daily[1];
        assert_eq!(tomorrow.condition.main, "Clear");
        assert_eq!(tomorrow.sunrise, None);
        assert_eq!(tomorrow.sunset, None);
        assert_eq!(tomorrow.uv_index_max, None);
    }

    #[test]
    fn test_unmatched_time_uses_first_sample() {
        let mut raw = sample();
        raw["current_weather"] = json!({"time": "2030-01-01T00:00"});
        let bundle = open_meteo(raw, UnitSystem::Metric).unwrap();
        assert_eq!(bundle.current.timestamp, MIDNIGHT + 4 * 3600);
        assert_eq!(bundle.current.temp_value, 22.0);
        assert_eq!(bundle.current.wind_speed_value, 9.0);
    }

    #[test]
    fn test_without_current_weather_block() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("current_weather");
        let bundle = open_meteo(raw, UnitSystem::Imperial).unwrap();
        assert_eq!(bundle.current.temp_value, 22.0);
        assert_eq!(bundle.current.wind_direction_degrees, None);
        assert_eq!(bundle.units, UnitSystem::Imperial);
    }

    #[test]
    fn test_output_is_ascending_and_capped() {
        let times: Vec<String> = (0..30)
            .rev()
            .map(|h| format!("2024-07-{:02}T{:02}:00", 15 + h / 24, h % 24))
            .collect();
        let temps: Vec<f64> = (0..30).map(|h| h as f64).collect();
        let raw = json!({
            "hourly": {"time": times, "temperature_2m": temps}
        });
        let bundle = open_meteo(raw, UnitSystem::Metric).unwrap();
        assert_eq!(bundle.hourly.len(), 12);
        assert!(bundle.hourly.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bundle.hourly[0].timestamp, MIDNIGHT);
        assert_eq!(bundle.timezone_label, "UTC");
    }

    #[test]
    fn test_no_temperature_is_shape_error() {
        let err = open_meteo(json!({"hourly": {"time": []}}), UnitSystem::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));

        let err = open_meteo(Value::String("oops".into()), UnitSystem::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
    }
}
