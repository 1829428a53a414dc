//! Weather backend: resolve a location, fetch current conditions and the
//! forecast concurrently, and fold the forecast into daily summaries.

use chrono::Utc;
use nimbus_core::ForecastConfig;
use tracing::instrument;

use crate::aggregate::{DailyAggregator, TodayCutoff};
use crate::error::WeatherError;
use crate::geocode::resolve_city;
use crate::location::Geolocator;
use crate::provider::OpenWeatherClient;
use crate::types::{Coordinates, TemperatureUnit, WeatherReport};

#[derive(Debug, Clone)]
pub struct WeatherService {
    client: OpenWeatherClient,
    geolocator: Geolocator,
    forecast: ForecastConfig,
}

impl WeatherService {
    pub fn new(client: OpenWeatherClient, geolocator: Geolocator) -> Self {
        Self {
            client,
            geolocator,
            forecast: ForecastConfig::default(),
        }
    }

    pub fn with_forecast_config(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    /// Report for a city name. Unresolvable names fail with `NotFound`.
    #[instrument(skip(self), level = "info")]
    pub async fn report_for_city(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError> {
        let location = resolve_city(&self.client, city).await?;
        self.report_for_coordinates(location.coordinates, unit).await
    }

    /// Report for the device position.
    #[instrument(skip(self), level = "info")]
    pub async fn report_for_current_location(
        &self,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError> {
        let coords = self.geolocator.locate().await?;
        self.report_for_coordinates(coords, unit).await
    }

    /// Both fetches must succeed; a failure in either fails the report.
    pub async fn report_for_coordinates(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<WeatherReport, WeatherError> {
        let (current, forecast) = tokio::try_join!(
            self.client.current(coords, unit),
            self.client.forecast_samples(coords),
        )?;

        let outcome = self
            .aggregator(unit)
            .with_utc_offset(forecast.utc_offset)
            .aggregate(&forecast.samples);

        tracing::info!(
            "Forecast for {}: {} days from {} samples",
            current.city_name,
            outcome.window.len(),
            forecast.samples.len()
        );

        Ok(WeatherReport {
            current,
            forecast: outcome.window,
        })
    }

    fn aggregator(&self, unit: TemperatureUnit) -> DailyAggregator {
        let mut aggregator = DailyAggregator::new(unit).with_max_days(self.forecast.max_days);
        if let Some(hour) = self.forecast.exclude_today_after_hour {
            aggregator = aggregator.with_today_cutoff(TodayCutoff { hour }, Utc::now());
        }
        if let Some(min) = self.forecast.min_samples_per_day {
            aggregator = aggregator.with_min_samples_per_day(min);
        }
        aggregator
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(dt: i64) -> serde_json::Value {
        serde_json::json!({
            "dt": dt,
            "main": { "temp": 280.0, "humidity": 80 },
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 6.0 },
            "pop": 0.6
        })
    }

    async fn mock_server(list: Vec<serde_json::Value>) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                "main": { "temp": 280.0, "feels_like": 278.0, "temp_min": 279.0, "temp_max": 281.0, "humidity": 80 },
                "dt": 1_709_251_200,
                "name": "Bergen"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": list,
                "city": { "timezone": 3600 }
            })))
            .mount(&server)
            .await;
        server
    }

    fn service(server: &MockServer, forecast: ForecastConfig) -> WeatherService {
        let client = OpenWeatherClient::new("test-key")
            .unwrap()
            .with_base_urls(&server.uri(), &server.uri());
        WeatherService::new(client, Geolocator::Unavailable).with_forecast_config(forecast)
    }

    #[tokio::test]
    async fn test_forecast_config_applied() {
        // One entry per day for six days, plus a second entry on the first day
        let start = 1_709_251_200;
        let mut list: Vec<_> = (0..6).map(|day| entry(start + day * 86_400)).collect();
        list.push(entry(start + 3 * 3_600));
        let server = mock_server(list).await;

        let forecast = ForecastConfig {
            max_days: 3,
            exclude_today_after_hour: None,
            min_samples_per_day: Some(2),
        };
        let report = service(&server, forecast)
            .report_for_coordinates(Coordinates::new(60.39, 5.32), TemperatureUnit::Celsius)
            .await
            .unwrap();

        assert_eq!(report.current.city_name, "Bergen");
        assert_eq!(report.forecast.len(), 1);
        assert_eq!(report.forecast.days()[0].temp_avg, 7);
    }

    #[tokio::test]
    async fn test_default_config_keeps_five_days() {
        let start = 1_709_251_200;
        let list: Vec<_> = (0..7).map(|day| entry(start + day * 86_400)).collect();
        let server = mock_server(list).await;

        let report = service(&server, ForecastConfig::default())
            .report_for_coordinates(Coordinates::new(60.39, 5.32), TemperatureUnit::Fahrenheit)
            .await
            .unwrap();

        assert_eq!(report.unit(), TemperatureUnit::Fahrenheit);
        assert_eq!(report.forecast.len(), 5);
        assert_eq!(report.current.temperature, 44);
    }

    #[tokio::test]
    async fn test_location_unavailable() {
        let server = mock_server(Vec::new()).await;
        let err = service(&server, ForecastConfig::default())
            .report_for_current_location(TemperatureUnit::Celsius)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Location(_)));
    }
}
