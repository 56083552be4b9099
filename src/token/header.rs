// src/token/header.rs

use crate::client::KeySetClient;
use crate::error::{Result, SiwaError};
use crate::key::{KeyCache, PublicKey};
use crate::model::RawHeader;
use serde::Deserialize;
use std::sync::Arc;

/// The decoded JOSE header of an identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    identifier: String,
    algorithm: String,
}

impl Header {
    /// Decodes the header object. `kid` and `alg` are required strings.
    pub fn decode(data: &serde_json::Value) -> Result<Self> {
        let raw = RawHeader::deserialize(data)
            .map_err(|e| SiwaError::MalformedToken(format!("invalid header: {}", e)))?;
        Ok(Self {
            identifier: raw.kid,
            algorithm: raw.alg,
        })
    }

    /// The `kid` naming the key that signed the token.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Resolves the signing key, consulting `cache` before the network.
    ///
    /// # Errors
    ///
    /// Returns [`SiwaError::KeyNotFound`] if the provider publishes no key with
    /// this identifier, or any error raised while fetching the key set.
    pub async fn resolve_public_key(
        &self,
        client: &KeySetClient,
        cache: Option<&KeyCache>,
    ) -> Result<Arc<dyn PublicKey>> {
        client
            .retrieve_by_id(&self.identifier, cache)
            .await?
            .ok_or_else(|| SiwaError::KeyNotFound(self.identifier.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_kid_and_alg() {
        let header = Header::decode(&json!({ "kid": "86D88Kf", "alg": "RS256" })).unwrap();
        assert_eq!(header.identifier(), "86D88Kf");
        assert_eq!(header.algorithm(), "RS256");
    }

    #[test]
    fn missing_fields_are_malformed() {
        for data in [json!({ "alg": "RS256" }), json!({ "kid": "K1" }), json!([])] {
            assert!(matches!(
                Header::decode(&data),
                Err(SiwaError::MalformedToken(_))
            ));
        }
    }
}
