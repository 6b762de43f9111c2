//! Key-value cache abstraction backing the orchestrator's idempotency store.
//!
//! The dispatch pipeline keys cached results by request fingerprint with a
//! bounded TTL. An in-memory moka backend is provided; deployments can swap
//! in Redis or any other backend by implementing [`Cache`].

mod in_memory;

pub use in_memory::InMemoryCache;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Cache trait for key-value storage with optional TTL.
///
/// Object-safe via type-erased bytes; use [`CacheExt::get`] and
/// [`CacheExt::set`] for typed access.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache as JSON bytes.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value with optional TTL. `None` means the backend's default TTL.
    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Delete a value from the cache.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Clear all values from the cache.
    async fn clear(&self) -> Result<()>;
}

/// Typed helpers over [`Cache`].
pub trait CacheExt: Cache {
    async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        if let Some(bytes) = self.get_bytes(key).await? {
            serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                crate::error::CoachwayError::internal(format!("Failed to deserialize: {}", e))
            })
        } else {
            Ok(None)
        }
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: serde::Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            crate::error::CoachwayError::internal(format!("Failed to serialize: {}", e))
        })?;
        self.set_bytes(key, bytes, ttl).await
    }
}

// Blanket implementation so every backend gets the typed helpers.
impl<T: Cache + ?Sized> CacheExt for T {}
