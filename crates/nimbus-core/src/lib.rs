//! Shared configuration, error types and logging setup for nimbus.

pub mod config;
pub mod error;

pub use config::{
    Config, ForecastConfig, LocationConfig, TemperatureUnit, ValidationResult, WeatherConfig,
    API_KEY_ENV, DEFAULT_API_URL, DEFAULT_GEOCODING_URL, MAX_FORECAST_DAYS,
};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize logging. Output goes to stderr so stdout stays clean for rendering.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("nimbus core initialized");
    Ok(())
}
