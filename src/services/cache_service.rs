use anyhow::Result;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{CacheSettings, CombinerConfig};
use crate::error::AppError;
use crate::models::CacheStatsResponse;
use crate::repositories::{CacheBackend, RedisRepo};
use crate::utils::{cache_key, gunzip, gzip, namespaced, CACHE_PREFIX};

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub stores: AtomicU64,
}

/// Advisory image cache. Backend failures never surface to callers of
/// `get`/`put`; they degrade to a miss or a skipped store.
#[derive(Clone)]
pub struct CacheService {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl_seconds: u64,
    stats: Arc<CacheStats>,
}

impl CacheService {
    /// Builds the cache from settings. Errors only when the cache is both
    /// enabled and required and Redis cannot be reached.
    pub async fn from_settings(settings: &CacheSettings) -> Result<Self> {
        if !settings.enabled {
            info!("Image cache disabled by configuration");
            return Ok(Self::disabled());
        }

        match RedisRepo::connect(settings).await {
            Ok(repo) => {
                info!(
                    "Connected to Redis at {}:{} (ttl {}s)",
                    settings.redis_host, settings.redis_port, settings.ttl_seconds
                );
                Ok(Self::with_backend(Arc::new(repo), settings.ttl_seconds))
            }
            Err(e) if settings.required => Err(e.context(format!(
                "Redis is required but unreachable at {}:{}",
                settings.redis_host, settings.redis_port
            ))),
            Err(e) => {
                warn!(
                    "Redis unavailable at {}:{}, continuing without cache: {:#}",
                    settings.redis_host, settings.redis_port, e
                );
                Ok(Self::disabled())
            }
        }
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>, ttl_seconds: u64) -> Self {
        Self {
            backend: Some(backend),
            ttl_seconds,
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl_seconds: 0,
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub async fn get(&self, urls: &[String], config: &CombinerConfig) -> Option<Bytes> {
        self.get_by_key(&cache_key(urls, config)).await
    }

    /// Looks up a key with or without the namespace prefix.
    pub async fn get_by_key(&self, key: &str) -> Option<Bytes> {
        let backend = self.backend.as_ref()?;
        let key = namespaced(key);

        let packed = match backend.get(&key).await {
            Ok(Some(packed)) => packed,
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Cache miss for {}", key);
                return None;
            }
            Err(e) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Cache read failed for {}: {:#}", key, e);
                return None;
            }
        };

        match gunzip(&packed) {
            Ok(image) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for {} ({} bytes)", key, image.len());
                Some(Bytes::from(image))
            }
            Err(e) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Stores the image and returns the namespaced key it was written to.
    pub async fn put(&self, urls: &[String], config: &CombinerConfig, image: &[u8]) -> Option<String> {
        let backend = self.backend.as_ref()?;
        let key = cache_key(urls, config);

        let packed = match gzip(image) {
            Ok(packed) => packed,
            Err(e) => {
                warn!("Failed to compress image for {}: {}", key, e);
                return None;
            }
        };

        match backend.set(&key, &packed, self.ttl_seconds).await {
            Ok(()) => {
                self.stats.stores.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cached {} ({} bytes, {} compressed)",
                    key,
                    image.len(),
                    packed.len()
                );
                Some(key)
            }
            Err(e) => {
                warn!("Cache write failed for {}: {:#}", key, e);
                None
            }
        }
    }

    pub async fn clear(&self) -> Result<u64, AppError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| AppError::CacheUnavailable("Cache is not enabled".to_string()))?;

        let deleted = backend
            .delete_prefix(CACHE_PREFIX)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear cache: {:#}", e)))?;
        info!("Cleared {} cached images", deleted);
        Ok(deleted)
    }

    pub async fn stats(&self) -> CacheStatsResponse {
        let mut response = CacheStatsResponse {
            enabled: self.is_enabled(),
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            stores: self.stats.stores.load(Ordering::Relaxed),
            ..CacheStatsResponse::default()
        };

        let Some(backend) = self.backend.as_ref() else {
            return response;
        };
        response.ttl_seconds = Some(self.ttl_seconds);

        if let Err(e) = backend.ping().await {
            response.error = Some(format!("{:#}", e));
            return response;
        }
        response.connected = true;

        match backend.count_prefix(CACHE_PREFIX).await {
            Ok(count) => response.keys_count = Some(count),
            Err(e) => response.error = Some(format!("{:#}", e)),
        }
        response.memory_used = backend.memory_usage().await.ok().flatten();

        response
    }
}
