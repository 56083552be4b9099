// src/error.rs

use crate::token::Verification;
use base64::DecodeError;
use thiserror::Error;

/// The primary error type for the `siwa` library.
#[derive(Debug, Error)]
pub enum SiwaError {
    /// A base64url segment or key component could not be decoded.
    #[error("Base64URL decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// The identity token does not have the expected structure or claims.
    #[error("Malformed identity token: {0}")]
    MalformedToken(String),

    /// A key record published by the provider is missing fields or unusable.
    #[error("Malformed public key: {0}")]
    MalformedKey(String),

    /// The key set could not be fetched (transport failure, timeout or non-success status).
    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    /// The key set response was not JSON, or had no `keys` array.
    #[error("Unexpected key set response: {0}")]
    ResponseFormat(String),

    /// No published key matches the token's `kid`.
    #[error("Key not found for kid: {0}")]
    KeyNotFound(String),

    /// Returned by the strict verification API when a token is rejected.
    #[error("Token verification failed: {0}")]
    VerificationFailed(Verification),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SiwaError {
    /// Whether this error points at an operational problem (network, unknown key)
    /// rather than at the token itself.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            SiwaError::Network(_) | SiwaError::ResponseFormat(_) | SiwaError::KeyNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SiwaError>;
