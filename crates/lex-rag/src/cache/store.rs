//! Cache storage abstraction: a swappable key/value backend plus the
//! draft-level wrapper that serializes values and absorbs backend failures.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::key::cache_key;
use crate::qa::QaReport;
use crate::types::CaseInput;

/// Key/value backend with SETEX-style expiry. Callers depend only on this
/// trait, never on backend specifics.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    /// Store with expiry. A ttl of zero is a no-op.
    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    /// Graceful shutdown.
    async fn quit(&self) -> Result<()>;
}

/// In-memory backend for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        Ok(())
    }
}

/// Redis backend. The multiplexed connection is cheap to clone and safe to
/// share across concurrent pipeline invocations.
pub struct RedisCache {
    connection: redis::aio::MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("invalid redis URL")?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("failed to connect to redis")?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }
        let mut connection = self.connection.clone();
        connection.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        // The multiplexed connection closes when the last clone drops.
        Ok(())
    }
}

/// Cached pipeline output for one case input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedDraft {
    pub minuta: String,
    pub qa: QaReport,
    pub tokens: u64,
    pub cached_at: DateTime<Utc>,
}

/// Draft-level cache: derives keys, serializes values as JSON, and degrades
/// any backend failure to a cache miss with a logged warning.
pub struct DraftCache {
    store: Box<dyn CacheStore>,
    prefix: String,
}

impl DraftCache {
    pub fn new(store: Box<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// In-memory cache with the default key prefix, for tests and local runs.
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::new(Box::new(MemoryCache::new()), prefix)
    }

    pub fn key_for(&self, input: &CaseInput) -> String {
        cache_key(input, &self.prefix)
    }

    pub async fn get(&self, key: &str) -> Option<CachedDraft> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache get failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cached value unparsable, treating as miss");
                None
            }
        }
    }

    pub async fn put(&self, key: &str, draft: &CachedDraft, ttl_seconds: u64) {
        if ttl_seconds == 0 {
            return;
        }
        let value = match serde_json::to_string(draft) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to serialize draft for cache");
                return;
            }
        };
        if let Err(e) = self.store.set(key, &value, ttl_seconds).await {
            tracing::warn!(key = %key, error = %e, "cache set failed");
        }
    }

    pub async fn quit(&self) {
        if let Err(e) = self.store.quit().await {
            tracing::warn!(error = %e, "cache shutdown failed");
        }
    }
}
