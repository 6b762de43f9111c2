//! In-memory cache backed by moka.
//!
//! Concurrent cache with TinyLFU eviction, automatic TTL expiration, and
//! per-entry TTL overrides. This is the default idempotency store for the
//! scheduling event orchestrator.

use crate::cache::Cache;
use crate::error::Result;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use std::time::{Duration, Instant};

/// Default TTL for entries when none is specified (24 hours).
const DEFAULT_TTL: Duration = Duration::from_secs(86400);

/// Cache entry with an optional per-entry TTL.
#[derive(Clone)]
struct CacheEntry {
    value: Vec<u8>,
    custom_ttl: Option<Duration>,
}

struct CacheExpiry {
    default_ttl: Duration,
}

impl Expiry<String, CacheEntry> for CacheExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.custom_ttl.unwrap_or(self.default_ttl))
    }

    fn expire_after_read(
        &self,
        _key: &String,
        _value: &CacheEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        // TTL semantics, not TTI: reads don't extend expiry.
        duration_until_expiry
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.custom_ttl.unwrap_or(self.default_ttl))
    }
}

/// In-memory cache backed by moka.
#[derive(Clone)]
pub struct InMemoryCache {
    inner: MokaCache<String, CacheEntry>,
}

impl InMemoryCache {
    /// Create a cache bounded by `max_entries`.
    pub fn new(max_entries: u64) -> Self {
        Self::with_ttl(max_entries, DEFAULT_TTL)
    }

    /// Create a cache with a custom default TTL.
    pub fn with_ttl(max_entries: u64, default_ttl: Duration) -> Self {
        let expiry = CacheExpiry { default_ttl };
        let cache = MokaCache::builder()
            .max_capacity(max_entries)
            .expire_after(expiry)
            .build();

        Self { inner: cache }
    }

    /// Force pending maintenance (eviction, expiration). Mostly for tests.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Current number of entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.get(key).await.map(|entry| entry.value))
    }

    async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = CacheEntry {
            value,
            custom_ttl: ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.invalidate_all();
        Ok(())
    }
}
