//! Device position for the "use my location" path.
//!
//! There is no portable position API for a terminal program, so the position
//! comes from the `[location]` config section. Without one the service reports
//! itself unavailable and callers surface that as a geolocation error.

use nimbus_core::LocationConfig;

use crate::error::LocationError;
use crate::types::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geolocator {
    /// A position fixed by configuration
    Configured(Coordinates),
    /// No position source; every lookup fails
    Unavailable,
}

impl Geolocator {
    pub fn from_config(config: &LocationConfig) -> Self {
        match config.coordinates() {
            Some((latitude, longitude)) => {
                Self::Configured(Coordinates::new(latitude, longitude))
            }
            None => Self::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        match self {
            Self::Configured(coords) => {
                tracing::info!(
                    "Using configured location: {}, {}",
                    coords.latitude,
                    coords.longitude
                );
                Ok(*coords)
            }
            Self::Unavailable => Err(LocationError::ServiceUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[tokio::test]
    async fn test_configured_location() {
        let config = LocationConfig {
            latitude: Some(47.6062),
            longitude: Some(-122.3321),
        };
        let locator = Geolocator::from_config(&config);
        assert!(locator.is_available());

        let coords = locator.locate().await.unwrap();
        assert_eq!(coords, Coordinates::new(47.6062, -122.3321));
    }

    #[tokio::test]
    async fn test_missing_location_is_unavailable() {
        let locator = Geolocator::from_config(&LocationConfig::default());
        assert!(!locator.is_available());
        assert!(matches!(
            locator.locate().await,
            Err(LocationError::ServiceUnavailable)
        ));
    }
}
