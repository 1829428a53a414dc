use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::units::convert_display;
pub use nimbus_core::TemperatureUnit;

/// Weather condition groups as reported by OpenWeatherMap.
///
/// Declaration order is significant: when two conditions tie on both count and
/// latest timestamp during daily aggregation, the one declared later wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Mist,
    Haze,
    Smoke,
    Dust,
    Sand,
    Ash,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Squall,
    Thunderstorm,
    Tornado,
}

impl WeatherCondition {
    /// Map an OpenWeatherMap condition id to its group.
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_owm_code(code: i32) -> Option<Self> {
        let condition = match code {
            200..=299 => Self::Thunderstorm,
            300..=399 => Self::Drizzle,
            500..=599 => Self::Rain,
            600..=699 => Self::Snow,
            701 => Self::Mist,
            711 => Self::Smoke,
            721 => Self::Haze,
            731 | 761 => Self::Dust,
            741 => Self::Fog,
            751 => Self::Sand,
            762 => Self::Ash,
            771 => Self::Squall,
            781 => Self::Tornado,
            800 => Self::Clear,
            801..=804 => Self::Clouds,
            _ => return None,
        };
        Some(condition)
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Mist => "Mist",
            Self::Haze => "Haze",
            Self::Smoke => "Smoke",
            Self::Dust => "Dust",
            Self::Sand => "Sand",
            Self::Ash => "Ash",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Squall => "Squall",
            Self::Thunderstorm => "Thunderstorm",
            Self::Tornado => "Tornado",
        }
    }

    /// Single glyph for terminal output
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀",
            Self::Clouds => "☁",
            Self::Drizzle | Self::Rain => "☂",
            Self::Snow => "❄",
            Self::Thunderstorm => "⚡",
            Self::Mist | Self::Haze | Self::Smoke | Self::Fog => "≋",
            Self::Dust | Self::Sand | Self::Ash | Self::Squall => "~",
            Self::Tornado => "🌪",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for WeatherCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let condition = match s.trim().to_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "mist" => Self::Mist,
            "haze" => Self::Haze,
            "smoke" => Self::Smoke,
            "dust" => Self::Dust,
            "sand" => Self::Sand,
            "ash" => Self::Ash,
            "fog" => Self::Fog,
            "drizzle" => Self::Drizzle,
            "rain" => Self::Rain,
            "snow" => Self::Snow,
            "squall" => Self::Squall,
            "thunderstorm" => Self::Thunderstorm,
            "tornado" => Self::Tornado,
            other => return Err(format!("unknown weather condition: {}", other)),
        };
        Ok(condition)
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A resolved place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub coordinates: Coordinates,
}

impl Location {
    /// "Springfield, Illinois, US" style name
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            parts.push(state);
        }
        if !self.country.is_empty() {
            parts.push(self.country.as_str());
        }
        parts.join(", ")
    }
}

/// One sub-daily forecast sample as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    /// Kelvin
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon_ref: String,
    pub humidity_percent: f64,
    /// Metres per second
    pub wind_speed: f64,
    /// 0.0 - 1.0
    pub precipitation_probability: f64,
}

impl RawSample {
    /// True when every numeric field is finite.
    pub fn is_valid(&self) -> bool {
        self.temperature.is_finite()
            && self.humidity_percent.is_finite()
            && self.wind_speed.is_finite()
            && self.precipitation_probability.is_finite()
    }
}

/// One calendar day reduced from its samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub calendar_date: NaiveDate,
    /// Full weekday name, e.g. "Monday"
    pub day_label: String,
    pub temp_min: i32,
    pub temp_max: i32,
    pub temp_avg: i32,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon_ref: String,
    pub humidity_avg: u8,
    /// Metres per second
    pub wind_speed_avg: f64,
    pub precipitation_probability_max: f64,
}

impl DailySummary {
    /// Re-express temperatures in another unit via the display-value relation.
    pub fn converted(&self, from: TemperatureUnit, to: TemperatureUnit) -> Self {
        Self {
            temp_min: convert_display(self.temp_min, from, to),
            temp_max: convert_display(self.temp_max, from, to),
            temp_avg: convert_display(self.temp_avg, from, to),
            ..self.clone()
        }
    }
}

/// Up to five daily summaries in ascending date order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForecastWindow {
    unit: TemperatureUnit,
    days: Vec<DailySummary>,
}

impl ForecastWindow {
    pub(crate) fn new(unit: TemperatureUnit, days: Vec<DailySummary>) -> Self {
        Self { unit, days }
    }

    /// Empty window expressed in `unit`.
    pub fn empty(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            days: Vec::new(),
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn days(&self) -> &[DailySummary] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailySummary> {
        self.days.iter()
    }

    /// Same window in `unit`; lossy by the rounding already in the stored values.
    pub fn to_unit(&self, unit: TemperatureUnit) -> Self {
        if unit == self.unit {
            return self.clone();
        }
        Self {
            unit,
            days: self
                .days
                .iter()
                .map(|day| day.converted(self.unit, unit))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ForecastWindow {
    type Item = &'a DailySummary;
    type IntoIter = std::slice::Iter<'a, DailySummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: i32,
    pub feels_like: i32,
    pub temp_min: i32,
    pub temp_max: i32,
    pub humidity: u8,
    /// hPa
    pub pressure: f64,
    /// Metres per second
    pub wind_speed: f64,
    /// Degrees
    pub wind_direction: f64,
    /// Metres
    pub visibility: Option<f64>,
    /// Percent cloud cover
    pub cloudiness: u8,
    pub condition: WeatherCondition,
    pub description: String,
    pub icon_ref: String,
    pub city_name: String,
    pub country: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
    /// Location's shift from UTC in seconds
    pub utc_offset_seconds: i32,
}

impl CurrentWeather {
    /// Location's UTC offset; UTC when the provider reported an invalid one.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Re-express temperatures in another unit via the display-value relation.
    pub fn converted(&self, from: TemperatureUnit, to: TemperatureUnit) -> Self {
        Self {
            temperature: convert_display(self.temperature, from, to),
            feels_like: convert_display(self.feels_like, from, to),
            temp_min: convert_display(self.temp_min, from, to),
            temp_max: convert_display(self.temp_max, from, to),
            ..self.clone()
        }
    }
}

/// Current conditions paired with the daily forecast, both in one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentWeather,
    pub forecast: ForecastWindow,
}

impl WeatherReport {
    pub fn unit(&self) -> TemperatureUnit {
        self.forecast.unit()
    }

    /// Convert both halves to `unit` if they are not already in it.
    pub fn into_unit(self, unit: TemperatureUnit) -> Self {
        let from = self.unit();
        if from == unit {
            return self;
        }
        Self {
            current: self.current.converted(from, unit),
            forecast: self.forecast.to_unit(unit),
        }
    }
}
