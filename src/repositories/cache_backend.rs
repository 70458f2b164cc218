use anyhow::Result;
use async_trait::async_trait;

/// Key-value store holding combined images. Implementations only need
/// single-key atomicity; TTL expiry is delegated to the store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()>;

    /// Deletes every key starting with `prefix`, returning how many went.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64>;

    async fn count_prefix(&self, prefix: &str) -> Result<u64>;

    /// Human-readable memory footprint, if the store reports one.
    async fn memory_usage(&self) -> Result<Option<String>>;

    async fn ping(&self) -> Result<()>;
}
