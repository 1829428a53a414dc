use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Upper bound on forecast days the provider can cover.
pub const MAX_FORECAST_DAYS: usize = 5;

/// OpenWeatherMap data endpoint used when `weather.api_url` is not set.
pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5";
/// OpenWeatherMap geocoding endpoint used when `weather.geocoding_url` is not set.
pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Temperature unit used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// The other unit.
    pub fn toggle(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Celsius => f.write_str("celsius"),
            Self::Fahrenheit => f.write_str("fahrenheit"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "celsius" | "metric" => Ok(Self::Celsius),
            "f" | "fahrenheit" | "imperial" => Ok(Self::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Daily forecast aggregation settings
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Fixed position used by the "use my location" path
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key (overridden by `OPENWEATHER_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the current weather and forecast endpoints
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for the geocoding endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Initial display unit
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_geocoding_url() -> String {
    DEFAULT_GEOCODING_URL.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            geocoding_url: default_geocoding_url(),
            temperature_unit: TemperatureUnit::Celsius,
        }
    }
}

impl WeatherConfig {
    /// Check if an API key is present (not a placeholder)
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty() && !k.starts_with("YOUR_"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Number of days kept after aggregation (1-5)
    #[serde(default = "default_max_days")]
    pub max_days: usize,

    /// Drop today's group once the location-local hour reaches this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_today_after_hour: Option<u32>,

    /// Drop days covered by fewer samples than this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_samples_per_day: Option<usize>,
}

fn default_max_days() -> usize {
    MAX_FORECAST_DAYS
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            max_days: default_max_days(),
            exclude_today_after_hour: None,
            min_samples_per_day: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Configured coordinates, if both halves are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nimbus")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            weather: WeatherConfig::default(),
            forecast: ForecastConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating a default file if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context("Failed to read config file")?;

            let mut config: Config = toml::from_str(&contents).map_err(|e| {
                ConfigError::ParseError(format!("{}: {}", config_path.display(), e))
            })?;
            if let Some(dir) = config_path.parent() {
                config.config_dir = dir.to_path_buf();
            }
            config
        } else {
            let mut config = Self::default();
            if let Some(dir) = config_path.parent() {
                config.config_dir = dir.to_path_buf();
            }
            config.save_to(config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load the default config file and validate it
    ///
    /// Warnings are logged. Validation errors fail with [`ConfigError::Invalid`].
    pub fn load_validated() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_validated_from(&config_path)
    }

    pub fn load_validated_from(config_path: &Path) -> Result<Self> {
        let config = Self::load_from(config_path)?;
        let validation = config.validate();

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                tracing::debug!("Using API key from {}", API_KEY_ENV);
                self.weather.api_key = Some(key);
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.api_url, "weather.api_url", &mut result);
        self.validate_url(
            &self.weather.geocoding_url,
            "weather.geocoding_url",
            &mut result,
        );

        // Missing key only matters once a request is made
        if !self.weather.is_configured() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured - set {} or weather.api_key", API_KEY_ENV),
            );
        }

        if self.forecast.max_days == 0 {
            result.add_error("forecast.max_days", "Forecast must keep at least one day");
        } else if self.forecast.max_days > MAX_FORECAST_DAYS {
            result.add_warning(
                "forecast.max_days",
                format!("Provider covers at most {} days", MAX_FORECAST_DAYS),
            );
        }

        if let Some(hour) = self.forecast.exclude_today_after_hour {
            if hour > 23 {
                result.add_error(
                    "forecast.exclude_today_after_hour",
                    format!("Hour must be between 0 and 23, got {}", hour),
                );
            }
        }

        if self.forecast.min_samples_per_day == Some(0) {
            result.add_warning(
                "forecast.min_samples_per_day",
                "A minimum of 0 samples has no effect",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..90");
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within -180..180");
                }
            }
            (None, None) => {}
            _ => {
                result.add_error(
                    "location",
                    "Both latitude and longitude must be set together",
                );
            }
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }
}
