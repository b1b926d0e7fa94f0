//! Error types for Lumina core services.

use thiserror::Error;

/// Errors raised by the external-service clients and domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input is not a US ZIP code.
    #[error("Invalid postal code: {0}")]
    InvalidPostalCode(String),

    /// The geocoder has no coordinates for this postal code.
    #[error("Postal code not found: {0}")]
    PostalCodeNotFound(String),

    /// HTTP transport error (connect failure, timeout, bad body).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered but not with something we understand.
    #[error("Unexpected response from {service}: {detail}")]
    UnexpectedResponse {
        service: &'static str,
        detail: String,
    },

    /// A required setting is absent.
    #[error("{0} is not set")]
    MissingSetting(&'static str),

    /// A setting is present but malformed.
    #[error("Invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },

    /// `/repsale` argument that names no known sale kind.
    #[error("Unknown sale kind: {0}")]
    UnknownSaleKind(String),

    /// The inventory form answered with something other than 200.
    #[error("Submission failed. Status code: {0}")]
    SubmissionRejected(u16),

    /// The signature image could not be encoded.
    #[error("Signature rendering failed: {0}")]
    Signature(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CoreError {
    fn from(e: url::ParseError) -> Self {
        CoreError::InvalidSetting {
            key: "url",
            value: e.to_string(),
        }
    }
}

impl From<image::ImageError> for CoreError {
    fn from(e: image::ImageError) -> Self {
        CoreError::Signature(e.to_string())
    }
}
