//! Forward geocoding: convert a free-text place name to coordinates.
//! Uses the OpenWeatherMap direct geocoding endpoint with the same API key.

use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::provider::OpenWeatherClient;
use crate::types::{Coordinates, Location};

/// Matches requested by `search_cities` callers that want a picker.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
struct GeocodingEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: String,
    state: Option<String>,
}

impl From<GeocodingEntry> for Location {
    fn from(entry: GeocodingEntry) -> Self {
        Location {
            name: entry.name,
            country: entry.country,
            state: entry.state,
            coordinates: Coordinates::new(entry.lat, entry.lon),
        }
    }
}

/// Search for places matching `query`, best match first.
/// A blank query returns no matches without a request.
#[instrument(skip(client), level = "info")]
pub async fn search_cities(
    client: &OpenWeatherClient,
    query: &str,
    limit: usize,
) -> Result<Vec<Location>, WeatherError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let url = format!("{}/direct", client.geocoding_url());
    let params = [
        ("q", query.to_string()),
        ("limit", limit.max(1).to_string()),
        ("appid", client.api_key().to_string()),
    ];

    let entries: Vec<GeocodingEntry> = client.get_json(&url, &params).await?;
    tracing::debug!("Geocoding '{}' returned {} matches", query, entries.len());

    Ok(entries.into_iter().map(Location::from).collect())
}

/// Resolve `query` to its single best match, or `NotFound`.
pub async fn resolve_city(
    client: &OpenWeatherClient,
    query: &str,
) -> Result<Location, WeatherError> {
    let location = search_cities(client, query, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::NotFound(query.trim().to_string()))?;

    tracing::info!(
        "Resolved '{}' to {} ({:.4}, {:.4})",
        query.trim(),
        location.display_name(),
        location.coordinates.latitude,
        location.coordinates.longitude
    );
    Ok(location)
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

    #[tokio::test]
    async fn test_resolve_city_best_match() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("q", "Springfield"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Springfield", "lat": 39.7817, "lon": -89.6501, "country": "US", "state": "Illinois" }
            ])))
            .mount(&server)
            .await;

        let location = resolve_city(&client_for(&server), "  Springfield ").await.unwrap();
        assert_eq!(location.display_name(), "Springfield, Illinois, US");
        assert!((location.coordinates.latitude - 39.7817).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_resolve_city_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let err = resolve_city(&client_for(&server), "Atlantis").await.unwrap_err();
        assert!(matches!(err, WeatherError::NotFound(ref name) if name == "Atlantis"));
        assert_eq!(err.user_message(), "City \"Atlantis\" not found");
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let matches = search_cities(&client_for(&server), "   ", DEFAULT_SEARCH_LIMIT)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_search_returns_all_matches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/direct"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "Paris", "lat": 48.8589, "lon": 2.32, "country": "FR" },
                { "name": "Paris", "lat": 33.66, "lon": -95.55, "country": "US", "state": "Texas" }
            ])))
            .mount(&server)
            .await;

        let matches = search_cities(&client_for(&server), "Paris", DEFAULT_SEARCH_LIMIT)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].display_name(), "Paris, Texas, US");
    }
}
