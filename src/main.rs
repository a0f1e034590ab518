//! Vibecast CLI
//!
//! Shows the cached forecast, then refreshes it from the live providers.

use anyhow::{Context, Result};
use argh::FromArgs;
use chrono::{DateTime, Local, TimeZone, Timelike, Utc};
use vibecast_core::{Config, ConfigError, UnitSystem};
use vibecast_weather::demo::sample_bundle;
use vibecast_weather::theme::{is_stormy, vibe_label, vibe_score, Theme, VibeInputs};
use vibecast_weather::units::{compass_point, or_unknown, speed_label, temperature_symbol};
use vibecast_weather::{
    Coordinates, FetchSettings, FixedLocation, Geocoder, HydrationState, Hydrator,
    LocationSource, RefreshOutcome, Unavailable, WeatherBundle, WeatherCache, WeatherProvider,
};

#[derive(FromArgs)]
/// Vibecast - current conditions and forecast from OpenWeather or Open-Meteo
struct Args {
    /// latitude to use instead of device location
    #[argh(option)]
    lat: Option<f64>,

    /// longitude to use instead of device location
    #[argh(option)]
    lon: Option<f64>,

    /// look up a city by name and show its weather
    #[argh(option, short = 'c')]
    city: Option<String>,

    /// unit system: metric or imperial (overrides config)
    #[argh(option, short = 'u')]
    units: Option<UnitSystem>,

    /// refresh for the last saved location instead of a full startup
    #[argh(switch, short = 'r')]
    refresh: bool,

    /// print offline sample data without touching the network
    #[argh(switch)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();
    vibecast_core::init()?;

    let (config, persistent) = match Config::load_validated() {
        Ok((config, _)) => (config, true),
        Err(ConfigError::NoConfigDir) => {
            tracing::warn!("No config directory; using defaults and an in-memory cache");
            (Config::default(), false)
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    let units = args.units.unwrap_or(config.weather.units);

    if args.demo {
        let bundle = sample_bundle(Utc::now(), units);
        print_bundle(&bundle);
        return Ok(());
    }

    let settings = FetchSettings::from(&config.weather);
    let provider = WeatherProvider::new(settings.clone())?;
    let cache = if persistent {
        WeatherCache::in_dir(&config.cache_dir())
    } else {
        WeatherCache::in_memory()
    };
    let default_location = config.weather.default_location.clone();

    match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => {
            let here = FixedLocation(Coordinates::new(lat, lon));
            let hydrator = Hydrator::new(provider, cache, here, default_location, units);
            run(&hydrator, &args, &settings).await
        }
        (None, None) => {
            let hydrator = Hydrator::new(provider, cache, Unavailable, default_location, units);
            run(&hydrator, &args, &settings).await
        }
        _ => anyhow::bail!("--lat and --lon must be given together"),
    }
}

async fn run<L: LocationSource>(
    hydrator: &Hydrator<L>,
    args: &Args,
    settings: &FetchSettings,
) -> Result<()> {
    let outcome = if let Some(city) = args.city.as_deref() {
        let geocoder = Geocoder::new(settings)?;
        let results = geocoder.search(city).await;
        let Some(place) = results.first() else {
            anyhow::bail!("No places found for {:?}", city);
        };
        for other in results.iter().skip(1) {
            tracing::info!("Other match: {} ({})", other.label(), other.coordinates());
        }
        hydrator
            .show_location(place.coordinates(), Some(place.label()))
            .await
    } else if args.refresh {
        hydrator.refresh().await
    } else {
        hydrator.start().await
    };

    if outcome == RefreshOutcome::AlreadyRunning {
        tracing::warn!("A fetch was already in progress");
    }

    print_state(&hydrator.state());
    Ok(())
}

fn format_time(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(t) => t.format("%a %H:%M").to_string(),
        None => ts.to_string(),
    }
}

fn format_updated(at: Option<DateTime<Utc>>) -> String {
    or_unknown(at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M")))
}

fn print_state(state: &HydrationState) {
    let place = state.place_label.as_deref().unwrap_or("Unknown location");
    match state.coordinates {
        Some(c) => println!("{} ({})", place, c),
        None => println!("{}", place),
    }
    if let Some(source) = state.coordinate_source {
        println!("  Location from: {:?}", source);
    }
    println!("  Last updated:  {}", format_updated(state.last_updated));
    if let Some(error) = &state.error {
        println!("  ! {}", error);
    }
    if state.is_loading() {
        println!("  (still loading)");
    }

    match &state.bundle {
        Some(bundle) => print_bundle(bundle),
        None => println!("\nNo weather available."),
    }
}

fn print_bundle(bundle: &WeatherBundle) {
    let deg = temperature_symbol(bundle.units);
    let speed = speed_label(bundle.units);
    let c = &bundle.current;

    println!("  Source:        {}", bundle.source_tag.label());
    println!("  Timezone:      {}", bundle.timezone_label);

    let description = c.condition.description.as_deref().unwrap_or(&c.condition.main);
    println!("\nNow: {:.0}{} {}", c.temp_value, deg, description);
    println!("  Feels like {:.0}{}", c.feels_like_value, deg);
    let direction = c.wind_direction_degrees.map(compass_point).unwrap_or("");
    println!("  Wind {:.0} {} {}", c.wind_speed_value, speed, direction);
    println!("  Clouds {:.0}%", c.cloud_cover_percent);
    println!("  Humidity {}%", or_unknown(c.humidity_percent));
    println!("  Pressure {} hPa", or_unknown(c.pressure_hpa));
    println!("  UV {}", or_unknown(c.uv_index));
    if is_stormy(&c.condition.main) {
        println!("  Storm warning: thunder in the area");
    }
    if let Some(today) = bundle.today() {
        println!(
            "  Today {:.0}{} / {:.0}{}, sun {}-{}",
            today.temp_min,
            deg,
            today.temp_max,
            deg,
            or_unknown(today.sunrise.map(format_time)),
            or_unknown(today.sunset.map(format_time))
        );
    }

    let theme = Theme::for_condition(&c.condition.main);
    let score = vibe_score(&VibeInputs::from_bundle(bundle, Local::now().hour()));
    println!(
        "  Theme {} ({}), vibe {} - {}",
        theme.icon_name(),
        theme.gradient().join(" "),
        score,
        vibe_label(score)
    );

    if !bundle.hourly.is_empty() {
        println!("\nNext hours:");
        for h in &bundle.hourly {
            let pop = h.precip_probability.map(|p| format!("{:.0}%", p * 100.0));
            println!(
                "  {}  {:>4.0}{}  {:<10} rain {}",
                format_time(h.timestamp),
                h.temp_value,
                deg,
                h.condition.main,
                or_unknown(pop)
            );
        }
    }

    if !bundle.daily.is_empty() {
        println!("\nNext days:");
        for d in &bundle.daily {
            println!(
                "  {}  {:>4.0}{} / {:>4.0}{}  {:<10} UV {}  sun {}-{}",
                format_time(d.timestamp),
                d.temp_min,
                deg,
                d.temp_max,
                deg,
                d.condition.main,
                or_unknown(d.uv_index_max),
                or_unknown(d.sunrise.map(format_time)),
                or_unknown(d.sunset.map(format_time))
            );
        }
    }
}
