//! Weather-specific error types.

use nimbus_core::{AppError, API_KEY_ENV};
use thiserror::Error;

/// Location service errors
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location service unavailable")]
    ServiceUnavailable,
}

/// Weather provider errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City \"{0}\" not found")]
    NotFound(String),

    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No weather API key configured")]
    MissingApiKey,
}

impl WeatherError {
    /// Message stored in the dashboard snapshot and shown in the error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(_) => self.to_string(),
            Self::Provider { message, .. } => message.clone(),
            Self::Network(e) if e.is_timeout() => {
                "The weather service did not respond in time. Please try again.".to_string()
            }
            Self::Network(_) => {
                "Unable to reach the weather service. Check your connection.".to_string()
            }
            Self::Location(LocationError::ServiceUnavailable) => {
                "Geolocation is not available on this device".to_string()
            }
            Self::Parse(_) => "Received an unexpected response from the weather service".to_string(),
            Self::MissingApiKey => format!("No weather API key configured. Set {}.", API_KEY_ENV),
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        AppError::weather(e.user_message(), e.to_string())
    }
}
