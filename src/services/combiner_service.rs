use anyhow::Result;
use bytes::Bytes;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::CombinerConfig;
use crate::error::AppError;
use crate::services::composer;

#[derive(Clone)]
pub struct CombinerService {
    config: CombinerConfig,
    client: reqwest::Client,
}

impl CombinerService {
    pub fn new(config: CombinerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("image-combiner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    /// Downloads one image. Any transport error or non-2xx status fails
    /// with the URL attached.
    pub async fn fetch_image(&self, url: &str) -> Result<Bytes, AppError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {}", status)));
        }

        let body = response.bytes().await.map_err(|e| AppError::fetch(url, e))?;
        debug!(
            "Fetched {} ({} bytes in {:?})",
            url,
            body.len(),
            started.elapsed()
        );
        Ok(body)
    }

    /// Downloads every URL, at most `max_concurrent_fetches` at a time.
    /// Results keep input order; the first failure aborts the rest.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<(String, Bytes)>, AppError> {
        stream::iter(urls.iter().map(|url| async move {
            let body = self.fetch_image(url).await?;
            Ok::<_, AppError>((url.clone(), body))
        }))
        .buffered(self.config.max_concurrent_fetches.max(1))
        .try_collect()
        .await
    }

    /// Fetch, lay out and encode. The image work runs on the blocking pool.
    pub async fn combine(&self, urls: &[String]) -> Result<Vec<u8>, AppError> {
        let started = Instant::now();
        let bodies = self.fetch_all(urls).await?;

        let config = self.config.clone();
        let jpeg = tokio::task::spawn_blocking(move || composer::render(&bodies, &config)).await??;

        info!(
            "Combined {} images into {} bytes in {:?}",
            urls.len(),
            jpeg.len(),
            started.elapsed()
        );
        Ok(jpeg)
    }
}
