use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;

use crate::config::CacheSettings;
use crate::repositories::CacheBackend;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DELETE_BATCH: usize = 500;

#[derive(Clone)]
pub struct RedisRepo {
    manager: ConnectionManager,
}

impl RedisRepo {
    /// Connects and pings once, so an unreachable server fails here rather
    /// than on the first request.
    pub async fn connect(settings: &CacheSettings) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(settings.redis_host.clone(), settings.redis_port),
            redis: RedisConnectionInfo {
                password: settings.redis_password.clone(),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;
        let manager = tokio::time::timeout(CONNECT_TIMEOUT, client.get_connection_manager())
            .await
            .with_context(|| {
                format!(
                    "Timed out connecting to Redis at {}:{}",
                    settings.redis_host, settings.redis_port
                )
            })??;

        let repo = Self { manager };
        repo.ping().await?;
        Ok(repo)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", prefix);
        let mut iter: redis::AsyncIter<String> = conn.scan_match(&pattern).await?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }
}

#[async_trait]
impl CacheBackend for RedisRepo {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()> {
        let mut conn = self.manager.clone();
        if ttl_seconds > 0 {
            conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        } else {
            conn.set::<_, _, ()>(key, value).await?;
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let keys = self.scan_prefix(prefix).await?;
        let mut conn = self.manager.clone();
        let mut deleted = 0u64;
        for batch in keys.chunks(DELETE_BATCH) {
            deleted += conn.del::<_, u64>(batch).await?;
        }
        Ok(deleted)
    }

    async fn count_prefix(&self, prefix: &str) -> Result<u64> {
        Ok(self.scan_prefix(prefix).await?.len() as u64)
    }

    async fn memory_usage(&self) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        let info: String = redis::cmd("INFO")
            .arg("memory")
            .query_async(&mut conn)
            .await?;
        Ok(parse_used_memory(&info))
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

fn parse_used_memory(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.strip_prefix("used_memory_human:"))
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_memory_is_read_from_info_block() {
        let info = "# Memory\r\nused_memory:1048576\r\nused_memory_human:1.00M\r\nused_memory_rss:2\r\n";
        assert_eq!(parse_used_memory(info).as_deref(), Some("1.00M"));
    }

    #[test]
    fn missing_memory_line_yields_none() {
        assert_eq!(parse_used_memory("# Memory\r\n"), None);
    }
}
