// src/client.rs

use crate::config::Config;
use crate::error::{Result, SiwaError};
use crate::key::{KeyCache, PublicKey, RemotePublicKey};
use crate::model::JsonWebKeySet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};
use url::Url;

/// A client for fetching the provider's JSON Web Key Set.
///
/// Cloning is cheap; clones share the HTTP connection pool and the fetch lock.
#[derive(Clone)]
pub struct KeySetClient {
    inner: Arc<Inner>,
}

struct Inner {
    http_client: reqwest::Client,
    key_set_url: Url,
    // Held for the duration of a cache-miss refetch.
    fetch_lock: Mutex<()>,
}

impl KeySetClient {
    /// Creates a new `KeySetClient`. Every request is bounded by `config.request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`SiwaError::InvalidConfiguration`] if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http_client = builder
            .build()
            .map_err(|e| SiwaError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http_client,
                key_set_url: config.key_set_url.clone(),
                fetch_lock: Mutex::new(()),
            }),
        })
    }

    pub fn key_set_url(&self) -> &Url {
        &self.inner.key_set_url
    }

    /// Fetches every currently published key.
    ///
    /// If a cache is supplied, all decoded keys are stored into it.
    ///
    /// # Errors
    ///
    /// * [`SiwaError::Network`] on transport failure, timeout or a non-success status.
    /// * [`SiwaError::ResponseFormat`] if the body is not JSON or lacks a `keys` array.
    /// * [`SiwaError::MalformedKey`] if any record cannot be decoded.
    #[instrument(skip(self, cache), fields(url = %self.inner.key_set_url), err)]
    pub async fn retrieve_all(&self, cache: Option<&KeyCache>) -> Result<Vec<Arc<dyn PublicKey>>> {
        let keys = self.fetch_key_set().await?;
        if let Some(cache) = cache {
            cache.store_many(keys.clone()).await;
        }
        Ok(keys)
    }

    /// Retrieves the key published under `identifier`.
    ///
    /// A cache hit returns without any network activity. On a miss the whole
    /// key set is refetched and, when a cache was supplied, stored into it.
    /// Returns `Ok(None)` when the provider does not publish such a key.
    #[instrument(skip(self, cache), err)]
    pub async fn retrieve_by_id(
        &self,
        identifier: &str,
        cache: Option<&KeyCache>,
    ) -> Result<Option<Arc<dyn PublicKey>>> {
        let Some(cache) = cache else {
            debug!("No key cache supplied, fetching key set for kid: {}", identifier);
            return Ok(find(self.retrieve_all(None).await?, identifier));
        };

        if let Some(key) = cache.retrieve(identifier).await {
            debug!("Key cache hit for kid: {}", identifier);
            return Ok(Some(key));
        }

        // Concurrent misses queue here; whoever runs second usually finds the key already cached.
        let _guard = self.inner.fetch_lock.lock().await;
        if let Some(key) = cache.retrieve(identifier).await {
            debug!("Key for kid {} was cached by a concurrent fetch", identifier);
            return Ok(Some(key));
        }

        debug!("Key cache miss for kid: {}. Fetching from provider.", identifier);
        let keys = self.retrieve_all(Some(cache)).await?;
        Ok(find(keys, identifier))
    }

    async fn fetch_key_set(&self) -> Result<Vec<Arc<dyn PublicKey>>> {
        let response = self
            .inner
            .http_client
            .get(self.inner.key_set_url.clone())
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;

        let key_set: JsonWebKeySet =
            serde_json::from_slice(&body).map_err(|e| SiwaError::ResponseFormat(e.to_string()))?;

        let keys: Vec<Arc<dyn PublicKey>> = RemotePublicKey::decode_many(&key_set.keys)?
            .into_iter()
            .map(|key| Arc::new(key) as Arc<dyn PublicKey>)
            .collect();

        debug!("Successfully fetched {} keys", keys.len());
        Ok(keys)
    }
}

impl std::fmt::Debug for KeySetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetClient")
            .field("key_set_url", &self.inner.key_set_url.as_str())
            .finish()
    }
}

fn find(keys: Vec<Arc<dyn PublicKey>>, identifier: &str) -> Option<Arc<dyn PublicKey>> {
    keys.into_iter().find(|key| key.identifier() == identifier)
}
