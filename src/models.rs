use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{CacheSettings, CombinerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Body of a 404 from `GET /image/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageNotFoundResponse {
    pub error: String,
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineResponse {
    pub success: bool,
    pub key: String,
    pub image_size: usize,
    pub urls_count: usize,
    pub cached: bool,
    pub retrieve_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub config: CombinerConfig,
    pub cache: CacheStatsResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub deleted: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettingsView {
    pub host: String,
    pub port: u16,
    pub password_set: bool,
    pub enable_cache: bool,
    pub redis_required: bool,
    pub cache_ttl: u64,
}

impl From<&CacheSettings> for RedisSettingsView {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            host: settings.redis_host.clone(),
            port: settings.redis_port,
            password_set: settings.redis_password.is_some(),
            enable_cache: settings.enabled,
            redis_required: settings.required,
            cache_ttl: settings.ttl_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub source: String,
    pub combiner: CombinerConfig,
    pub redis_settings: RedisSettingsView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub version: String,
    pub features: Vec<String>,
    pub endpoints: Value,
    pub usage: Value,
}
