// src/verifier.rs

use crate::client::KeySetClient;
use crate::config::Config;
use crate::error::{Result, SiwaError};
use crate::key::KeyCache;
use crate::token::{IdentityToken, Verification};
use tracing::{debug, instrument, warn};

/// The identity token verifier.
///
/// Create one per process and share it: it owns the key set client and a key
/// cache that every verification reads from and populates, so repeated
/// tokens from the same signer do not refetch the key set.
#[derive(Clone, Debug)]
pub struct Verifier {
    client: KeySetClient,
    cache: KeyCache,
}

impl Verifier {
    /// Creates a new `Verifier` with the given configuration and an empty cache.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_cache(KeySetClient::new(&config)?, KeyCache::new()))
    }

    /// Creates a `Verifier` around an existing client and cache.
    pub fn with_cache(client: KeySetClient, cache: KeyCache) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &KeySetClient {
        &self.client
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }

    /// Fetches the current key set into the cache ahead of the first token.
    pub async fn prefetch(&self) -> Result<usize> {
        let keys = self.client.retrieve_all(Some(&self.cache)).await?;
        Ok(keys.len())
    }

    /// Parses and checks a raw token, returning the detailed outcome.
    ///
    /// # Errors
    ///
    /// Parse errors and key resolution failures (network, unknown `kid`) are
    /// returned as `Err`; they are never folded into a rejection.
    #[instrument(skip(self, raw_token), err)]
    pub async fn check(
        &self,
        raw_token: impl AsRef<[u8]>,
        audience: &str,
        ignore_expiry: bool,
    ) -> Result<(IdentityToken, Verification)> {
        let token = IdentityToken::parse(raw_token)?;
        debug!(
            "Parsed identity token for sub: {}, kid: {}",
            token.payload().subject(),
            token.header().identifier()
        );

        match token
            .verify(&self.client, audience, Some(&self.cache), ignore_expiry)
            .await
        {
            Ok(verification) => Ok((token, verification)),
            Err(e) => {
                if e.is_operational() {
                    warn!("Could not resolve signing key: {}", e);
                }
                Err(e)
            }
        }
    }

    /// Returns `Ok(true)` only for a token that is correctly signed, unexpired
    /// (unless `ignore_expiry`) and issued for `audience`.
    pub async fn is_validly_signed(
        &self,
        raw_token: impl AsRef<[u8]>,
        audience: &str,
        ignore_expiry: bool,
    ) -> Result<bool> {
        let (_, verification) = self.check(raw_token, audience, ignore_expiry).await?;
        Ok(verification.is_valid())
    }

    /// Returns the verified token, or [`SiwaError::VerificationFailed`] with the reason.
    pub async fn verify(
        &self,
        raw_token: impl AsRef<[u8]>,
        audience: &str,
        ignore_expiry: bool,
    ) -> Result<IdentityToken> {
        match self.check(raw_token, audience, ignore_expiry).await? {
            (token, Verification::Valid) => Ok(token),
            (_, rejection) => Err(SiwaError::VerificationFailed(rejection)),
        }
    }
}
