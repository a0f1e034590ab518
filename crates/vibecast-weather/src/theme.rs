//! Condition classification and derived "vibe" scoring.

use serde::{Deserialize, Serialize};

use crate::types::WeatherBundle;
use crate::units::{clamp, to_celsius, to_kmh};

/// Visual theme buckets derived from a condition's `main` string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Clear,
    Cloudy,
    Rain,
    #[default]
    Night,
}

impl Theme {
    /// Classify a provider condition string (case-insensitive substring match)
    pub fn for_condition(main: &str) -> Self {
        let m = main.to_lowercase();
        if ["rain", "drizzle", "storm", "thunder"]
            .iter()
            .any(|k| m.contains(k))
        {
            Self::Rain
        } else if m.contains("cloud") {
            Self::Cloudy
        } else if m.contains("clear") {
            Self::Clear
        } else {
            Self::Night
        }
    }

    /// Background gradient stops, top to bottom
    pub fn gradient(&self) -> [&'static str; 3] {
        match self {
            Self::Clear => ["#ff71ce", "#7a5cff", "#66d9ff"],
            Self::Cloudy => ["#5a4b8a", "#3a2f6b", "#1c1a42"],
            Self::Rain => ["#4e5b9a", "#2a2b57", "#12122b"],
            Self::Night => ["#0b0b2b", "#151542", "#2a2a72"],
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::Cloudy => "cloud",
            Self::Rain => "cloud_rain",
            Self::Night => "moon",
        }
    }
}

/// True for thunderstorm-like conditions
pub fn is_stormy(main: &str) -> bool {
    let m = main.to_lowercase();
    m.contains("storm") || m.contains("thunder")
}

/// Local hours 6-8 and 18-20
pub fn is_golden_hour(hour: u32) -> bool {
    (6..=8).contains(&hour) || (18..=20).contains(&hour)
}

/// Inputs for the vibe score, in metric units
#[derive(Debug, Clone, Copy)]
pub struct VibeInputs {
    pub temp_c: f64,
    pub wind_kmh: f64,
    pub uv_index: Option<f64>,
    pub cloud_cover_percent: f64,
    /// 0..1
    pub precip_probability: Option<f64>,
    pub local_hour: u32,
}

impl VibeInputs {
    /// Current conditions of a bundle, with the next hour's precipitation chance
    pub fn from_bundle(bundle: &WeatherBundle, local_hour: u32) -> Self {
        let current = &bundle.current;
        Self {
            temp_c: to_celsius(current.temp_value, bundle.units),
            wind_kmh: to_kmh(current.wind_speed_value, bundle.units),
            uv_index: current.uv_index,
            cloud_cover_percent: current.cloud_cover_percent,
            precip_probability: bundle.hourly.first().and_then(|h| h.precip_probability),
            local_hour,
        }
    }
}

/// 0..100 comfort score; 22°C, light wind, low UV and dry skies score highest.
/// Unknown UV is scored as a moderate 4.
pub fn vibe_score(inputs: &VibeInputs) -> u8 {
    let uv = inputs.uv_index.unwrap_or(4.0);
    let mut score = 100.0;
    score -= (inputs.temp_c - 22.0).abs() * 2.0;
    score -= (inputs.wind_kmh - 10.0).max(0.0) * 1.2;
    score -= (uv - 6.0).max(0.0) * 2.0;
    if is_golden_hour(inputs.local_hour) {
        score += 10.0;
    }
    score -= inputs.precip_probability.unwrap_or(0.0) * 15.0;
    if inputs.cloud_cover_percent > 80.0 {
        score -= 5.0;
    }
    clamp(score.round(), 0.0, 100.0) as u8
}

pub fn vibe_label(score: u8) -> &'static str {
    match score {
        0..=30 => "Stormy Mood",
        31..=70 => "Cruising",
        _ => "Neon Breeze",
    }
}
