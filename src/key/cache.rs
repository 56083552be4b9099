// src/key/cache.rs

use super::PublicKey;
use moka::future::Cache;
use std::sync::Arc;
use tracing::debug;

/// An in-process store of public keys, indexed by key identifier.
///
/// Entries never expire and are never evicted; the cache lives exactly as
/// long as the caller keeps it. Clones share the same storage, so one cache
/// can be handed to every concurrent verification.
#[derive(Clone)]
pub struct KeyCache {
    keys: Cache<String, Arc<dyn PublicKey>>,
}

impl KeyCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            keys: Cache::builder().build(),
        }
    }

    /// Inserts a key, replacing any key already stored under its identifier.
    pub async fn store(&self, key: Arc<dyn PublicKey>) {
        debug!("Caching public key kid: {}", key.identifier());
        self.keys.insert(key.identifier().to_string(), key).await;
    }

    pub async fn store_many<I>(&self, keys: I)
    where
        I: IntoIterator<Item = Arc<dyn PublicKey>>,
    {
        for key in keys {
            self.store(key).await;
        }
    }

    /// Looks up a key by identifier. Never performs network activity.
    pub async fn retrieve(&self, identifier: &str) -> Option<Arc<dyn PublicKey>> {
        self.keys.get(identifier).await
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.keys.contains_key(identifier)
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache")
            .field("entries", &self.keys.entry_count())
            .finish()
    }
}
