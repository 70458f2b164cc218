use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Options file injected by the Home Assistant supervisor.
pub const DEFAULT_OPTIONS_PATH: &str = "/data/options.json";

const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: u16 = 6379;

/// Largest grid the layout table knows how to fill.
pub const MAX_SUPPORTED_IMAGES: usize = 4;

/// Upper bound for either cell side, keeping a 2x2 canvas well inside `u32`.
pub const MAX_CELL_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub combiner: CombinerConfig,
    pub cache: CacheSettings,
    pub source: ConfigSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    File,
    Environment,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub max_payload_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinerConfig {
    pub max_images: usize,
    pub image_quality: u8,
    pub cell_width: u32,
    pub cell_height: u32,
    pub timeout_seconds: u64,
    pub max_concurrent_fetches: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    pub enabled: bool,
    pub required: bool,
    pub redis_host: String,
    pub redis_port: u16,
    #[serde(skip_serializing)]
    pub redis_password: Option<String>,
    pub ttl_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workers: num_cpus::get(),
            max_payload_size: 64 * 1024,
        }
    }
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            max_images: 4,
            image_quality: 85,
            cell_width: 400,
            cell_height: 300,
            timeout_seconds: 10,
            max_concurrent_fetches: 1,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            required: true,
            redis_host: DEFAULT_REDIS_HOST.to_string(),
            redis_port: DEFAULT_REDIS_PORT,
            redis_password: None,
            ttl_seconds: 600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            combiner: CombinerConfig::default(),
            cache: CacheSettings::default(),
            source: ConfigSource::Environment,
        }
    }
}

/// Shape of the add-on `options.json`. Every key is optional so a partial
/// file still falls back to defaults.
#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    max_images: Option<usize>,
    image_quality: Option<u8>,
    cell_width: Option<u32>,
    cell_height: Option<u32>,
    timeout: Option<u64>,
    max_concurrent_fetches: Option<usize>,
    redis_host: Option<String>,
    redis_port: Option<u16>,
    redis_password: Option<String>,
    cache_ttl: Option<u64>,
    enable_cache: Option<bool>,
    redis_required: Option<bool>,
}

impl Config {
    /// Loads the options file when it exists, otherwise the environment.
    /// Server settings always come from the environment.
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let options_path =
            env::var("OPTIONS_PATH").unwrap_or_else(|_| DEFAULT_OPTIONS_PATH.to_string());
        Self::load_from(&options_path, |name| env::var(name).ok())
    }

    /// Same as [`Config::load`] with an explicit options path and variable
    /// lookup. An existing options file wins over every combiner and cache
    /// variable.
    pub fn load_from<F>(options_path: &str, var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if Path::new(options_path).exists() {
            Self::from_options_file(options_path)?
        } else {
            Self::from_vars(&var)?
        };
        config.server = ServerConfig::from_vars(&var)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_options_file(path: &str) -> anyhow::Result<Self> {
        let options: OptionsFile = config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Json))
            .build()
            .and_then(|raw| raw.try_deserialize())
            .with_context(|| format!("Failed to read options file: {}", path))?;

        let mut config = Config {
            source: ConfigSource::File,
            ..Config::default()
        };

        if let Some(max_images) = options.max_images {
            config.combiner.max_images = max_images;
        }
        if let Some(image_quality) = options.image_quality {
            config.combiner.image_quality = image_quality;
        }
        if let Some(cell_width) = options.cell_width {
            config.combiner.cell_width = cell_width;
        }
        if let Some(cell_height) = options.cell_height {
            config.combiner.cell_height = cell_height;
        }
        if let Some(timeout) = options.timeout {
            config.combiner.timeout_seconds = timeout;
        }
        if let Some(max_concurrent_fetches) = options.max_concurrent_fetches {
            config.combiner.max_concurrent_fetches = max_concurrent_fetches;
        }
        if let Some(redis_host) = options.redis_host {
            config.cache.redis_host = redis_host;
        }
        if let Some(redis_port) = options.redis_port {
            config.cache.redis_port = redis_port;
        }
        config.cache.redis_password = options.redis_password;
        if let Some(cache_ttl) = options.cache_ttl {
            config.cache.ttl_seconds = cache_ttl;
        }
        if let Some(enable_cache) = options.enable_cache {
            config.cache.enabled = enable_cache;
        }
        if let Some(redis_required) = options.redis_required {
            config.cache.required = redis_required;
        }

        Ok(config)
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        // Combiner configuration
        if let Some(max_images) = var("MAX_IMAGES") {
            config.combiner.max_images = parse_var("MAX_IMAGES", &max_images)?;
        }
        if let Some(image_quality) = var("IMAGE_QUALITY") {
            config.combiner.image_quality = parse_var("IMAGE_QUALITY", &image_quality)?;
        }
        if let Some(cell_width) = var("CELL_WIDTH") {
            config.combiner.cell_width = parse_var("CELL_WIDTH", &cell_width)?;
        }
        if let Some(cell_height) = var("CELL_HEIGHT") {
            config.combiner.cell_height = parse_var("CELL_HEIGHT", &cell_height)?;
        }
        if let Some(timeout) = var("TIMEOUT") {
            config.combiner.timeout_seconds = parse_var("TIMEOUT", &timeout)?;
        }
        if let Some(max_concurrent_fetches) = var("MAX_CONCURRENT_FETCHES") {
            config.combiner.max_concurrent_fetches =
                parse_var("MAX_CONCURRENT_FETCHES", &max_concurrent_fetches)?;
        }

        // Cache configuration
        if let Some(redis_host) = var("REDIS_HOST") {
            config.cache.redis_host = redis_host;
        }
        if let Some(redis_port) = var("REDIS_PORT") {
            config.cache.redis_port = parse_var("REDIS_PORT", &redis_port)?;
        }
        if let Some(redis_password) = var("REDIS_PASSWORD") {
            config.cache.redis_password = Some(redis_password);
        }
        if let Some(cache_ttl) = var("CACHE_TTL") {
            config.cache.ttl_seconds = parse_var("CACHE_TTL", &cache_ttl)?;
        }
        if let Some(enable_cache) = var("ENABLE_CACHE") {
            config.cache.enabled = parse_flag(&enable_cache)?;
        }
        if let Some(redis_required) = var("REDIS_REQUIRED") {
            config.cache.required = parse_flag(&redis_required)?;
        }

        Ok(config)
    }

    /// Applies the fallbacks the add-on has always used for blank Redis
    /// options.
    pub fn normalize(&mut self) {
        if self.cache.redis_host.trim().is_empty() {
            self.cache.redis_host = DEFAULT_REDIS_HOST.to_string();
        }
        if self.cache.redis_port == 0 {
            self.cache.redis_port = DEFAULT_REDIS_PORT;
        }
        if self
            .cache
            .redis_password
            .as_deref()
            .map(str::is_empty)
            .unwrap_or(false)
        {
            self.cache.redis_password = None;
        }
        if self.combiner.max_concurrent_fetches == 0 {
            self.combiner.max_concurrent_fetches = 1;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let combiner = &self.combiner;
        if combiner.max_images == 0 || combiner.max_images > MAX_SUPPORTED_IMAGES {
            bail!(
                "max_images must be between 1 and {}, got {}",
                MAX_SUPPORTED_IMAGES,
                combiner.max_images
            );
        }
        if !(1..=100).contains(&combiner.image_quality) {
            bail!(
                "image_quality must be between 1 and 100, got {}",
                combiner.image_quality
            );
        }
        if !(1..=MAX_CELL_DIMENSION).contains(&combiner.cell_width)
            || !(1..=MAX_CELL_DIMENSION).contains(&combiner.cell_height)
        {
            bail!(
                "cell dimensions must be between 1 and {}, got {}x{}",
                MAX_CELL_DIMENSION,
                combiner.cell_width,
                combiner.cell_height
            );
        }
        if combiner.timeout_seconds == 0 {
            bail!("timeout must be at least one second");
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut server = ServerConfig::default();

        if let Some(host) = var("HOST") {
            server.host = host;
        }
        if let Some(port) = var("PORT") {
            server.port = parse_var("PORT", &port)?;
        }
        if let Some(workers) = var("WORKERS") {
            server.workers = parse_var("WORKERS", &workers)?;
        }
        if let Some(max_payload_size) = var("MAX_PAYLOAD_SIZE") {
            server.max_payload_size = parse_var("MAX_PAYLOAD_SIZE", &max_payload_size)?;
        }

        Ok(server)
    }
}

fn parse_var<T>(name: &str, value: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", name, value))
}

/// Accepts the spellings shell scripts and the supervisor emit for booleans.
fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("invalid boolean value: {}", other),
    }
}
