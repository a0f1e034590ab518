//! Unit conversion and formatting helpers.

use crate::types::UnitSystem;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// m/s to km/h
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * 3.6
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh / 1.609_344
}

pub fn mph_to_kmh(mph: f64) -> f64 {
    mph * 1.609_344
}

/// Temperature in °C regardless of the unit system it was fetched in
pub fn to_celsius(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => fahrenheit_to_celsius(value),
    }
}

/// Wind speed in km/h regardless of the unit system it was fetched in
pub fn to_kmh(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => mph_to_kmh(value),
    }
}

pub fn temperature_symbol(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "°C",
        UnitSystem::Imperial => "°F",
    }
}

pub fn speed_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "km/h",
        UnitSystem::Imperial => "mph",
    }
}

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Render an optional reading, never turning absence into a zero.
pub fn or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "unknown".to_string(),
    }
}

/// 16-point compass label for a meteorological direction (0 = North)
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let normalized = degrees.rem_euclid(360.0);
    let index = ((normalized / 22.5).round() as usize) % POINTS.len();
    POINTS[index]
}
