//! OpenWeatherMap client for current conditions and the 3-hour forecast.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use nimbus_core::{WeatherConfig, DEFAULT_API_URL, DEFAULT_GEOCODING_URL};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::error::WeatherError;
use crate::types::{Coordinates, CurrentWeather, RawSample, TemperatureUnit, WeatherCondition};
use crate::units::{convert, round_half_up};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("nimbus/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCondition {
    id: Option<i32>,
    main: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

impl WireCondition {
    fn condition(&self) -> Option<WeatherCondition> {
        self.main
            .as_deref()
            .and_then(|main| main.parse().ok())
            .or_else(|| self.id.and_then(WeatherCondition::from_owm_code))
    }
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
struct CurrentMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    #[serde(default)]
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentSys {
    #[serde(default)]
    country: String,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<WireCondition>,
    main: CurrentMain,
    visibility: Option<f64>,
    wind: Option<Wind>,
    clouds: Option<Clouds>,
    dt: i64,
    #[serde(default)]
    sys: CurrentSys,
    #[serde(default)]
    timezone: i32,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SampleMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireSample {
    dt: Option<i64>,
    main: Option<SampleMain>,
    #[serde(default)]
    weather: Vec<WireCondition>,
    wind: Option<Wind>,
    pop: Option<f64>,
}

impl WireSample {
    /// None when a required field is missing.
    fn into_sample(self) -> Option<RawSample> {
        let timestamp = DateTime::from_timestamp(self.dt?, 0)?;
        let main = self.main?;
        let weather = self.weather.into_iter().next()?;
        let condition = weather.condition()?;

        Some(RawSample {
            timestamp,
            temperature: main.temp?,
            condition,
            description: weather.description,
            icon_ref: weather.icon,
            humidity_percent: main.humidity?,
            wind_speed: self.wind.and_then(|w| w.speed)?,
            // Older payloads omit pop when no precipitation is expected
            precipitation_probability: self.pop.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<serde_json::Value>,
    city: Option<ForecastCity>,
}

/// Forecast samples as parsed from the provider, before aggregation.
#[derive(Debug, Clone)]
pub struct ForecastSamples {
    pub samples: Vec<RawSample>,
    /// Offset of the forecast location, UTC when not reported
    pub utc_offset: FixedOffset,
    /// Entries dropped for missing required fields
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    api_url: String,
    geocoding_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
        })
    }

    /// Build from config; fails with `MissingApiKey` when no key is set.
    pub fn from_config(config: &WeatherConfig) -> Result<Self, WeatherError> {
        if !config.is_configured() {
            return Err(WeatherError::MissingApiKey);
        }
        let api_key = config.api_key.clone().unwrap_or_default();
        Ok(Self::new(api_key)?.with_base_urls(&config.api_url, &config.geocoding_url))
    }

    /// Point the client at different endpoints (self-hosted proxies, mock servers).
    pub fn with_base_urls(mut self, api_url: &str, geocoding_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self.geocoding_url = geocoding_url.trim_end_matches('/').to_string();
        self
    }

    /// Current conditions at `coords`, temperatures in `unit`.
    #[instrument(skip(self), level = "info")]
    pub async fn current(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/weather", self.api_url);
        let body: CurrentResponse = self.get_json(&url, &self.coordinate_query(coords)).await?;

        let weather = body
            .weather
            .first()
            .ok_or_else(|| WeatherError::Parse("current weather has no condition".to_string()))?;
        let condition = weather.condition().ok_or_else(|| {
            WeatherError::Parse(format!(
                "unknown condition {:?} (id {:?})",
                weather.main, weather.id
            ))
        })?;
        let observed_at = DateTime::from_timestamp(body.dt, 0)
            .ok_or_else(|| WeatherError::Parse(format!("invalid timestamp {}", body.dt)))?;

        Ok(CurrentWeather {
            temperature: convert(body.main.temp, unit),
            feels_like: convert(body.main.feels_like, unit),
            temp_min: convert(body.main.temp_min, unit),
            temp_max: convert(body.main.temp_max, unit),
            humidity: round_half_up(body.main.humidity).clamp(0.0, 100.0) as u8,
            pressure: body.main.pressure,
            wind_speed: body.wind.as_ref().and_then(|w| w.speed).unwrap_or(0.0),
            wind_direction: body.wind.as_ref().and_then(|w| w.deg).unwrap_or(0.0),
            visibility: body.visibility,
            cloudiness: body
                .clouds
                .and_then(|c| c.all)
                .map(|all| round_half_up(all).clamp(0.0, 100.0) as u8)
                .unwrap_or(0),
            condition,
            description: weather.description.clone(),
            icon_ref: weather.icon.clone(),
            city_name: body.name,
            country: body.sys.country,
            sunrise: body.sys.sunrise.and_then(|t| DateTime::from_timestamp(t, 0)),
            sunset: body.sys.sunset.and_then(|t| DateTime::from_timestamp(t, 0)),
            observed_at,
            utc_offset_seconds: body.timezone,
        })
    }

    /// Raw 3-hour forecast samples at `coords`.
    ///
    /// Entries that fail to parse or lack a required field are dropped and
    /// counted rather than failing the request.
    #[instrument(skip(self), level = "info")]
    pub async fn forecast_samples(
        &self,
        coords: Coordinates,
    ) -> Result<ForecastSamples, WeatherError> {
        let url = format!("{}/forecast", self.api_url);
        let body: ForecastResponse = self.get_json(&url, &self.coordinate_query(coords)).await?;

        let total = body.list.len();
        let samples: Vec<RawSample> = body
            .list
            .into_iter()
            .filter_map(|entry| serde_json::from_value::<WireSample>(entry).ok())
            .filter_map(WireSample::into_sample)
            .collect();
        let rejected = total - samples.len();

        if rejected > 0 {
            tracing::warn!(rejected, total, "Dropped malformed forecast entries");
        }

        let utc_offset = body
            .city
            .and_then(|c| c.timezone)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        tracing::debug!(samples = samples.len(), %utc_offset, "Parsed forecast");
        Ok(ForecastSamples {
            samples,
            utc_offset,
            rejected,
        })
    }

    fn coordinate_query(&self, coords: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("lat", coords.latitude.to_string()),
            ("lon", coords.longitude.to_string()),
            ("appid", self.api_key.clone()),
        ]
    }

    pub(crate) fn geocoding_url(&self) -> &str {
        &self.geocoding_url
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    /// GET `url` and decode JSON, turning non-success statuses into `Provider` errors
    /// carrying the provider's own message.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)));
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Failed to fetch weather data")
                    .to_string()
            });

        tracing::debug!("Weather request to {} failed with {}: {}", url, status, message);
        Err(WeatherError::Provider {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new("test-key")
            .unwrap()
            .with_base_urls(&server.uri(), &server.uri())
    }

    fn london() -> Coordinates {
        Coordinates::new(51.5074, -0.1278)
    }

    fn forecast_entry(dt: i64, temp: f64, main: &str) -> serde_json::Value {
        serde_json::json!({
            "dt": dt,
            "main": { "temp": temp, "humidity": 70 },
            "weather": [{ "id": 803, "main": main, "description": "broken clouds", "icon": "04d" }],
            "wind": { "speed": 4.1, "deg": 240 },
            "pop": 0.3
        })
    }

    #[test]
    fn test_default_endpoints_match_config_defaults() {
        let client = OpenWeatherClient::new("k").unwrap();
        assert_eq!(client.api_url, WeatherConfig::default().api_url);
        assert_eq!(client.geocoding_url(), WeatherConfig::default().geocoding_url);
    }

    #[tokio::test]
    async fn test_current_weather_parsed_and_converted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "test-key"))
            .and(query_param("lat", "51.5074"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                "main": {
                    "temp": 288.15, "feels_like": 287.0, "temp_min": 286.0,
                    "temp_max": 290.0, "pressure": 1012, "humidity": 81
                },
                "visibility": 10000,
                "wind": { "speed": 5.1, "deg": 250 },
                "clouds": { "all": 75 },
                "dt": 1_700_000_000,
                "sys": { "country": "GB", "sunrise": 1_699_990_000, "sunset": 1_700_020_000 },
                "timezone": 0,
                "name": "London"
            })))
            .mount(&server)
            .await;

        let current = client_for(&server)
            .current(london(), TemperatureUnit::Celsius)
            .await
            .unwrap();

        assert_eq!(current.temperature, 15);
        assert_eq!(current.temp_max, 17);
        assert_eq!(current.humidity, 81);
        assert_eq!(current.condition, WeatherCondition::Rain);
        assert_eq!(current.description, "light rain");
        assert_eq!(current.icon_ref, "10d");
        assert_eq!(current.city_name, "London");
        assert_eq!(current.country, "GB");
        assert_eq!(current.cloudiness, 75);
    }

    #[tokio::test]
    async fn test_provider_error_message_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "cod": 401,
                "message": "Invalid API key."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .current(london(), TemperatureUnit::Celsius)
            .await
            .unwrap_err();

        match err {
            WeatherError::Provider { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_error_without_body_uses_status_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).forecast_samples(london()).await.unwrap_err();
        assert_eq!(err.user_message(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_forecast_drops_malformed_entries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "list": [
                    forecast_entry(1_700_000_000, 285.0, "Clouds"),
                    { "dt": 1_700_010_800, "weather": [] },
                    { "main": { "temp": "warm" } },
                    forecast_entry(1_700_021_600, 283.0, "Unknown"),
                    forecast_entry(1_700_032_400, 281.0, "Rain")
                ],
                "city": { "name": "Paris", "timezone": 3600 }
            })))
            .mount(&server)
            .await;

        let forecast = client_for(&server).forecast_samples(london()).await.unwrap();

        // "Unknown" falls back to the numeric id (803 = Clouds)
        assert_eq!(forecast.samples.len(), 3);
        assert_eq!(forecast.rejected, 2);
        assert_eq!(forecast.utc_offset.local_minus_utc(), 3600);
        assert_eq!(forecast.samples[1].condition, WeatherCondition::Clouds);
        assert_eq!(forecast.samples[2].condition, WeatherCondition::Rain);
        assert!((forecast.samples[0].precipitation_probability - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_forecast_without_list_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200"
            })))
            .mount(&server)
            .await;

        let forecast = client_for(&server).forecast_samples(london()).await.unwrap();
        assert!(forecast.samples.is_empty());
        assert_eq!(forecast.rejected, 0);
        assert_eq!(forecast.utc_offset.local_minus_utc(), 0);
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = WeatherConfig::default();
        assert!(matches!(
            OpenWeatherClient::from_config(&config),
            Err(WeatherError::MissingApiKey)
        ));
    }

    #[test]
    fn test_missing_pop_defaults_to_zero() {
        let wire: WireSample = serde_json::from_value(serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 280.0, "humidity": 50 },
            "weather": [{ "main": "Clear", "description": "clear sky", "icon": "01n" }],
            "wind": { "speed": 1.0 }
        }))
        .unwrap();
        let sample = wire.into_sample().unwrap();
        assert_eq!(sample.precipitation_probability, 0.0);
    }

    #[test]
    fn test_missing_wind_rejects_sample() {
        let wire: WireSample = serde_json::from_value(serde_json::json!({
            "dt": 1_700_000_000,
            "main": { "temp": 280.0, "humidity": 50 },
            "weather": [{ "main": "Clear" }]
        }))
        .unwrap();
        assert!(wire.into_sample().is_none());
    }
}
