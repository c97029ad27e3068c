use thiserror::Error;

use crate::common::error::SdQuotaError::GenericError;

#[derive(Debug, Error)]
pub enum SdQuotaError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error(transparent)]
    QuotaError(#[from] tally::QuotaError),
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<serde_json::error::Error> for SdQuotaError {
    fn from(e: serde_json::error::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for SdQuotaError {
    fn from(error: toml::de::Error) -> Self {
        Self::ConfigError(error.to_string())
    }
}

impl From<anyhow::Error> for SdQuotaError {
    fn from(error: anyhow::Error) -> Self {
        Self::GenericError(format!("{error:#}"))
    }
}

pub fn error<T>(message: String) -> crate::Result<T> {
    Err(GenericError(message))
}

impl From<String> for SdQuotaError {
    fn from(e: String) -> Self {
        GenericError(e)
    }
}
