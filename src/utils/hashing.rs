use serde_json::json;

use crate::config::CombinerConfig;

/// Namespace shared by every key this service writes to Redis.
pub const CACHE_PREFIX: &str = "image_combiner:";

/// Digest identifying one combination. URLs are sorted first so the key
/// ignores request order; every layout-affecting setting is folded in.
pub fn combination_digest(urls: &[String], config: &CombinerConfig) -> String {
    let mut sorted: Vec<&str> = urls.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let payload = json!({
        "urls": sorted,
        "config": {
            "quality": config.image_quality,
            "cell_width": config.cell_width,
            "cell_height": config.cell_height,
            "max_images": config.max_images,
        }
    });

    format!("{:x}", md5::compute(payload.to_string().as_bytes()))
}

pub fn cache_key(urls: &[String], config: &CombinerConfig) -> String {
    namespaced(&combination_digest(urls, config))
}

/// Adds the namespace unless the caller already supplied it.
pub fn namespaced(key: &str) -> String {
    if key.starts_with(CACHE_PREFIX) {
        key.to_string()
    } else {
        format!("{}{}", CACHE_PREFIX, key)
    }
}

pub fn strip_namespace(key: &str) -> &str {
    key.strip_prefix(CACHE_PREFIX).unwrap_or(key)
}
