use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use super::{
    chronological, decode, first_condition, openweather_wind, OwCondition, DAILY_LIMIT,
    FALLBACK_CURRENT, FALLBACK_FORECAST, HOURLY_LIMIT,
};
use crate::error::FetchError;
use crate::types::{
    Condition, CurrentConditions, DailyEntry, HourlyEntry, SourceTag, UnitSystem, WeatherBundle,
};

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    dt: i64,
    main: CurrentMain,
    weather: Vec<OwCondition>,
    wind: Option<Wind>,
    clouds: Option<Clouds>,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Option<f64>,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Clouds {
    all: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
    city: Option<City>,
}

#[derive(Debug, Deserialize)]
struct City {
    name: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: Option<ForecastMain>,
    #[serde(default)]
    weather: Vec<OwCondition>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
}

/// One UTC calendar day of 3-hour entries
struct DayBucket {
    date: NaiveDate,
    timestamp: i64,
    min: f64,
    max: f64,
    condition: Condition,
    pop: Option<f64>,
}

impl DayBucket {
    fn absorb(&mut self, lo: f64, hi: f64, pop: Option<f64>) {
        self.min = self.min.min(lo);
        self.max = self.max.max(hi);
        self.pop = match (self.pop, pop) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

/// Map OpenWeather 2.5 current conditions plus the 3-hour forecast list
pub fn openweather(
    current: Value,
    forecast: Value,
    units: UnitSystem,
) -> Result<WeatherBundle, FetchError> {
    let cur: CurrentResponse = decode(current, "OpenWeather current")?;
    let fc: ForecastResponse = decode(forecast, "OpenWeather forecast")?;

    let wind = cur.wind.as_ref();
    let current = CurrentConditions {
        timestamp: cur.dt,
        temp_value: cur.main.temp,
        feels_like_value: cur.main.feels_like.unwrap_or(cur.main.temp),
        wind_speed_value: openweather_wind(wind.and_then(|w| w.speed).unwrap_or(0.0), units),
        wind_direction_degrees: wind.and_then(|w| w.deg),
        uv_index: None,
        cloud_cover_percent: cur.clouds.and_then(|c| c.all).unwrap_or(0.0),
        humidity_percent: cur.main.humidity,
        pressure_hpa: cur.main.pressure,
        condition: first_condition(&cur.weather, FALLBACK_CURRENT),
    };

    let hourly = fc
        .list
        .iter()
        .take(HOURLY_LIMIT)
        .filter_map(|item| {
            Some(HourlyEntry {
                timestamp: item.dt,
                temp_value: item.main.as_ref()?.temp?,
                precip_probability: item.pop,
                condition: first_condition(&item.weather, FALLBACK_FORECAST),
            })
        })
        .collect();

    let daily = daily_buckets(&fc.list)
        .into_iter()
        .map(|b| DailyEntry {
            timestamp: b.timestamp,
            temp_min: b.min,
            temp_max: b.max,
            precip_probability: b.pop,
            condition: b.condition,
            sunrise: None,
            sunset: None,
            uv_index_max: None,
            humidity_percent: None,
            pressure_hpa: None,
        })
        .collect();

    let timezone_label = fc
        .city
        .and_then(|c| {
            c.name
                .filter(|n| !n.is_empty())
                .or(c.country.filter(|n| !n.is_empty()))
        })
        .unwrap_or_else(|| "UTC".to_string());

    Ok(WeatherBundle {
        timezone_label,
        current,
        hourly: chronological(hourly, |h: &HourlyEntry| h.timestamp),
        daily: chronological(daily, |d: &DailyEntry| d.timestamp),
        source_tag: SourceTag::LiveProviderB,
        units,
    })
}

/// Group by UTC date of `dt`, keeping the first seven days in arrival order
fn daily_buckets(list: &[ForecastItem]) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();

    for item in list {
        let Some(main) = item.main.as_ref() else {
            continue;
        };
        let (Some(lo), Some(hi)) = (main.temp_min.or(main.temp), main.temp_max.or(main.temp))
        else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(item.dt, 0).map(|d| d.date_naive()) else {
            continue;
        };

        if let Some(bucket) = buckets.iter_mut().find(|b| b.date == date) {
            bucket.absorb(lo, hi, item.pop);
            continue;
        }
        if buckets.len() == DAILY_LIMIT {
            continue;
        }
        buckets.push(DayBucket {
            date,
            timestamp: item.dt,
            min: lo,
            max: hi,
            condition: first_condition(&item.weather, FALLBACK_FORECAST),
            pop: item.pop,
        });
    }

    buckets
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use serde_json::json;

    // 2024-07-15T00:00:00Z
    const DAY: i64 = 1_721_001_600;

    fn current(wind: f64) -> Value {
        json!({
            "dt": DAY + 3600,
            "main": {"temp": 12.0, "humidity": 70, "pressure": 1009},
            "weather": [{"main": "Rain", "description": "light rain"}],
            "wind": {"speed": wind, "deg": 180},
            "clouds": {"all": 90}
        })
    }

    fn forecast(list: Value) -> Value {
        json!({"list": list, "city": {"name": "Toronto", "country": "CA"}})
    }

    #[test]
    fn test_same_day_entries_aggregate() {
        let list = json!([
            {"dt": DAY + 3 * 3600, "main": {"temp": 10, "temp_min": 9, "temp_max": 11},
             "weather": [{"main": "Rain"}], "pop": 0.6},
            {"dt": DAY + 6 * 3600, "main": {"temp": 13, "temp_min": 12, "temp_max": 14},
             "weather": [{"main": "Clouds"}], "pop": 0.2}
        ]);
        let bundle = openweather(current(1.0), forecast(list), UnitSystem::Metric).unwrap();

        assert_eq!(bundle.daily.len(), 1);
        let day = &bundle.daily[0];
        assert_eq!(day.temp_min, 9.0);
        assert_eq!(day.temp_max, 14.0);
        assert_eq!(day.condition.main, "Rain");
        assert_eq!(day.precip_probability, Some(0.6));
        assert_eq!(day.timestamp, DAY + 3 * 3600);
        assert_eq!(day.sunrise, None);
        assert_eq!(day.uv_index_max, None);
    }

    #[test]
    fn test_later_entry_raises_day_pop() {
        let list = json!([
            {"dt": DAY, "main": {"temp_min": 10, "temp_max": 12},
             "weather": [{"main": "Rain"}], "pop": 0.3},
            {"dt": DAY + 3 * 3600, "main": {"temp_min": 9, "temp_max": 14},
             "weather": [{"main": "Clear"}], "pop": 0.6}
        ]);
        let bundle = openweather(current(1.0), forecast(list), UnitSystem::Metric).unwrap();

        assert_eq!(bundle.daily.len(), 1);
        let day = &bundle.daily[0];
        assert_eq!(day.temp_min, 9.0);
        assert_eq!(day.temp_max, 14.0);
        assert_eq!(day.condition.main, "Rain");
        assert_eq!(day.precip_probability, Some(0.6));
        assert_eq!(day.timestamp, DAY);
    }

    #[test]
    fn test_wind_units() {
        let list = json!([]);
        let imperial = openweather(current(5.0), forecast(list.clone()), UnitSystem::Imperial).unwrap();
        assert_eq!(imperial.current.wind_speed_value, 5.0);

        let metric = openweather(current(5.0), forecast(list), UnitSystem::Metric).unwrap();
        assert!((metric.current.wind_speed_value - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_current_fields() {
        let bundle = openweather(current(2.0), forecast(json!([])), UnitSystem::Metric).unwrap();
        let c = &bundle.current;
        assert_eq!(bundle.source_tag, SourceTag::LiveProviderB);
        assert_eq!(bundle.timezone_label, "Toronto");
        assert_eq!(c.feels_like_value, 12.0);
        assert_eq!(c.cloud_cover_percent, 90.0);
        assert_eq!(c.wind_direction_degrees, Some(180.0));
        assert_eq!(c.uv_index, None);
        assert_eq!(c.condition.description.as_deref(), Some("light rain"));
    }

    #[test]
    fn test_days_split_on_utc_date() {
        let list = json!([
            {"dt": DAY + 21 * 3600, "main": {"temp": 15}, "weather": [{"main": "Clear"}]},
            {"dt": DAY + 24 * 3600, "main": {"temp": 11}, "weather": [{"main": "Clouds"}]},
            {"dt": DAY + 27 * 3600, "main": {"temp": 8}}
        ]);
        let bundle = openweather(current(1.0), forecast(list), UnitSystem::Metric).unwrap();

        assert_eq!(bundle.daily.len(), 2);
        assert_eq!(bundle.daily[0].temp_min, 15.0);
        assert_eq!(bundle.daily[0].precip_probability, None);
        assert_eq!(bundle.daily[1].temp_min, 8.0);
        assert_eq!(bundle.daily[1].temp_max, 11.0);
        assert_eq!(bundle.daily[1].condition.main, "Clouds");
    }

    #[test]
    fn test_daily_capped_at_seven_days() {
        let list: Vec<Value> = (0..10)
            .map(|d| json!({"dt": DAY + d * 86_400, "main": {"temp": d}}))
            .collect();
        let bundle = openweather(current(1.0), forecast(json!(list)), UnitSystem::Metric).unwrap();
        assert_eq!(bundle.daily.len(), 7);
        assert_eq!(bundle.daily[6].timestamp, DAY + 6 * 86_400);
    }

    #[test]
    fn test_hourly_first_twelve_sorted() {
        let mut list: Vec<Value> = (0..16)
            .map(|i| json!({"dt": DAY + i * 10_800, "main": {"temp": i}}))
            .collect();
        list.swap(0, 1);
        let bundle = openweather(current(1.0), forecast(json!(list)), UnitSystem::Metric).unwrap();

        assert_eq!(bundle.hourly.len(), 12);
        assert!(bundle
            .hourly
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(bundle.hourly[0].condition.main, "Unknown");
    }

    #[test]
    fn test_entries_without_temperature_are_ignored() {
        let list = json!([
            {"dt": DAY, "weather": [{"main": "Snow"}]},
            {"dt": DAY + 3600, "main": {"temp_min": 4, "temp_max": 6}}
        ]);
        let bundle = openweather(current(1.0), forecast(list), UnitSystem::Metric).unwrap();
        assert!(bundle.hourly.is_empty());
        assert_eq!(bundle.daily.len(), 1);
        assert_eq!(bundle.daily[0].timestamp, DAY + 3600);
        assert_eq!(bundle.daily[0].condition.main, "Unknown");
    }

    #[test]
    fn test_missing_weather_array_is_shape_error() {
        let cur = json!({"dt": DAY, "main": {"temp": 1.0}});
        let err = openweather(cur, forecast(json!([])), UnitSystem::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
    }

    #[test]
    fn test_missing_list_is_shape_error() {
        let err = openweather(current(1.0), json!({"cod": "200"}), UnitSystem::Metric).unwrap_err();
        assert!(matches!(err, FetchError::Shape(_)));
    }

    #[test]
    fn test_timezone_label_falls_back() {
        let fc = json!({"list": [], "city": {"name": "", "country": "CA"}});
        let bundle = openweather(current(1.0), fc, UnitSystem::Metric).unwrap();
        assert_eq!(bundle.timezone_label, "CA");

        let bundle = openweather(current(1.0), json!({"list": []}), UnitSystem::Metric).unwrap();
        assert_eq!(bundle.timezone_label, "UTC");
    }
}
