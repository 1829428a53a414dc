//! Top-level error type for the nimbus binary.
//!
//! Domain crates keep their own error enums and convert into [`AppError`] at
//! the boundary, handing over a message that is already fit for display.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A weather operation failed before a query could run.
    #[error("{detail}")]
    Weather { message: String, detail: String },

    #[error("{0:#}")]
    Other(anyhow::Error),
}

impl AppError {
    /// `message` is shown to the user, `detail` goes to the log.
    pub fn weather(message: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::Weather {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Message suitable for the terminal.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Weather { message, .. } => message.clone(),
            AppError::Other(e) => e.to_string(),
        }
    }
}

/// Config failures arrive wrapped in `anyhow`; recover them so they keep
/// their own message.
impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<ConfigError>() {
            Ok(config) => AppError::Config(config),
            Err(other) => AppError::Other(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Invalid(summary) => {
                format!("Invalid configuration ({}). Check your settings.", summary)
            }
            ConfigError::ParseError(detail) => {
                format!("Configuration file is malformed: {}", detail)
            }
        }
    }
}
