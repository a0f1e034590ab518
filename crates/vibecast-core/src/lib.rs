//! Shared configuration and startup plumbing for Vibecast.

pub mod config;
pub mod error;

pub use config::{
    Config, DefaultLocation, EndpointConfig, UnitSystem, ValidationResult, WeatherConfig,
    API_KEY_ENV,
};
pub use error::ConfigError;

use anyhow::Result;

/// Initialize logging
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Vibecast core initialized");
    Ok(())
}
