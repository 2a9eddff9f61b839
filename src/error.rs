//! Error types for the smoke test runner.

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed environment configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Identity provisioning or sign-in failed; the run cannot continue
    #[error("{0}")]
    Setup(String),

    /// An auth API call outside setup answered with an unexpected status
    #[error("{context} returned status {status}: {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
