// src/config.rs

use crate::error::{Result, SiwaError};
use once_cell::sync::Lazy;
use std::time::Duration;
use url::Url;

/// Apple's published JSON Web Key Set.
pub const APPLE_KEY_SET_URL: &str = "https://appleid.apple.com/auth/keys";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static APPLE_KEY_SET: Lazy<Url> =
    Lazy::new(|| Url::parse(APPLE_KEY_SET_URL).expect("APPLE_KEY_SET_URL is a valid URL"));

/// Settings for fetching the provider's public keys.
///
/// Everything the library needs is carried here explicitly; nothing is read
/// from the environment. `Config::default()` targets Apple; use
/// [`ConfigBuilder`] to override any setting.
#[derive(Debug, Clone)]
pub struct Config {
    /// The key set endpoint.
    pub key_set_url: Url,
    /// Upper bound on a single key set fetch, including connecting and reading the body.
    pub request_timeout: Duration,
    /// Optional `User-Agent` header for key set requests.
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_set_url: APPLE_KEY_SET.clone(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: None,
        }
    }
}

/// A builder for creating a `Config` instance.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    key_set_url: Option<Url>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the key set endpoint. Defaults to [`APPLE_KEY_SET_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`SiwaError::InvalidUrl`] if `url` cannot be parsed.
    pub fn key_set_url(mut self, url: &str) -> Result<Self> {
        let parsed_url = Url::parse(url).map_err(|e| SiwaError::InvalidUrl(e.to_string()))?;
        self.key_set_url = Some(parsed_url);
        Ok(self)
    }

    /// Sets the timeout for key set requests. Defaults to 10 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Consumes the builder and returns a `Config` object.
    ///
    /// # Errors
    ///
    /// Returns [`SiwaError::InvalidConfiguration`] if the request timeout is zero.
    pub fn build(self) -> Result<Config> {
        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(SiwaError::InvalidConfiguration(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        let key_set_url = self.key_set_url.unwrap_or_else(|| APPLE_KEY_SET.clone());

        Ok(Config {
            key_set_url,
            request_timeout,
            user_agent: self.user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_apple() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.key_set_url.as_str(), APPLE_KEY_SET_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn default_config_matches_untouched_builder() {
        let config = Config::default();
        let built = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.key_set_url, built.key_set_url);
        assert_eq!(config.key_set_url.as_str(), APPLE_KEY_SET_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = ConfigBuilder::new()
            .key_set_url("http://127.0.0.1:8080/keys")
            .unwrap()
            .request_timeout(Duration::from_millis(250))
            .user_agent("siwa-tests")
            .build()
            .unwrap();
        assert_eq!(config.key_set_url.as_str(), "http://127.0.0.1:8080/keys");
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.user_agent.as_deref(), Some("siwa-tests"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            ConfigBuilder::new().key_set_url("not a url"),
            Err(SiwaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(
            ConfigBuilder::new().request_timeout(Duration::ZERO).build(),
            Err(SiwaError::InvalidConfiguration(_))
        ));
    }
}
