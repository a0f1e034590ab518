//! Offline sample data for `--demo` and tests.

use chrono::{DateTime, Utc};

use crate::types::{
    Condition, CurrentConditions, DailyEntry, HourlyEntry, SourceTag, UnitSystem, WeatherBundle,
};
use crate::units::{celsius_to_fahrenheit, kmh_to_mph};

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Deterministic bundle anchored at `now`, expressed in `units`
pub fn sample_bundle(now: DateTime<Utc>, units: UnitSystem) -> WeatherBundle {
    let t0 = now.timestamp();
    let temp = |c: f64| match units {
        UnitSystem::Metric => round1(c),
        UnitSystem::Imperial => round1(celsius_to_fahrenheit(c)),
    };
    let speed = |kmh: f64| match units {
        UnitSystem::Metric => round1(kmh),
        UnitSystem::Imperial => round1(kmh_to_mph(kmh)),
    };

    let current = CurrentConditions {
        timestamp: t0,
        temp_value: temp(23.0),
        feels_like_value: temp(24.0),
        wind_speed_value: speed(8.0),
        wind_direction_degrees: Some(180.0),
        uv_index: Some(4.0),
        cloud_cover_percent: 20.0,
        humidity_percent: Some(50.0),
        pressure_hpa: Some(1015.0),
        condition: Condition::with_description("Clear", Some("clear sky".to_string())),
    };

    let hourly = (0..12_i64)
        .map(|i| HourlyEntry {
            timestamp: t0 + i * 3600,
            temp_value: temp(22.0 + (i as f64 / 2.0).sin() * 2.0),
            precip_probability: Some(if i % 5 == 0 { 0.3 } else { 0.0 }),
            condition: Condition::new(if i % 7 == 0 { "Clouds" } else { "Clear" }),
        })
        .collect();

    let daily = (0..7_i64)
        .map(|i| {
            let day = t0 + i * 86_400;
            DailyEntry {
                timestamp: day,
                temp_min: temp(18.0 + (i % 2) as f64),
                temp_max: temp(26.0 + (i % 3) as f64),
                precip_probability: Some(if i == 3 { 0.5 } else { 0.1 }),
                condition: Condition::new(if i == 3 { "Rain" } else { "Clear" }),
                sunrise: Some(day + 6 * 3600),
                sunset: Some(day + 20 * 3600),
                uv_index_max: Some(6.0 + (i % 3) as f64),
                humidity_percent: None,
                pressure_hpa: None,
            }
        })
        .collect();

    WeatherBundle {
        timezone_label: "America/Toronto".to_string(),
        current,
        hourly,
        daily,
        source_tag: SourceTag::Demo,
        units,
    }
}
