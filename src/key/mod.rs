// src/key/mod.rs

//! Public signing keys and the in-process key cache.

mod cache;
mod remote;

pub use cache::KeyCache;
pub use remote::RemotePublicKey;

use crate::error::Result;
use rsa::RsaPublicKey;
use std::fmt;

/// A public key able to verify identity token signatures.
///
/// Implementations are immutable once constructed; the reconstructed RSA
/// key they hand out is never mutated.
pub trait PublicKey: fmt::Debug + Send + Sync {
    /// The key identifier (`kid`) this key is published under.
    fn identifier(&self) -> &str;

    /// The RSA public key `(n, e)` used for signature verification.
    fn rsa_public_key(&self) -> Result<&RsaPublicKey>;
}

/// A key supplied directly by the caller rather than fetched from the provider.
#[derive(Debug, Clone)]
pub struct PinnedPublicKey {
    identifier: String,
    key: RsaPublicKey,
}

impl PinnedPublicKey {
    pub fn new(identifier: impl Into<String>, key: RsaPublicKey) -> Self {
        Self {
            identifier: identifier.into(),
            key,
        }
    }
}

impl PublicKey for PinnedPublicKey {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn rsa_public_key(&self) -> Result<&RsaPublicKey> {
        Ok(&self.key)
    }
}
