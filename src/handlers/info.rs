use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::models::{ConfigResponse, RedisSettingsView, ServiceInfoResponse};
use crate::AppState;

pub async fn service_info(state: web::Data<AppState>) -> HttpResponse {
    let max_images = state.combiner.config().max_images;

    HttpResponse::Ok().json(ServiceInfoResponse {
        service: "Image Combiner API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: vec![
            "grid layout for up to 4 images".to_string(),
            "aspect-preserving resize".to_string(),
            "redis cache with unique retrieval keys".to_string(),
        ],
        endpoints: json!({
            "POST /combine": format!("Combine up to {} images into one JPEG", max_images),
            "GET /image/{key}": "Retrieve a combined image by key",
            "GET /health": "Service health and cache status",
            "GET /cache/stats": "Cache statistics",
            "POST /cache/clear": "Delete every cached image",
            "GET /config": "Effective configuration",
            "GET /": "API information",
        }),
        usage: json!({
            "method": "POST",
            "url": "/combine",
            "content_type": "application/json",
            "body": { "urls": ["url1", "url2", "url3", "url4"] },
            "response": {
                "success": true,
                "key": "<md5 digest>",
                "image_size": 123456,
                "urls_count": 4,
                "cached": false,
                "retrieve_url": "/image/<md5 digest>",
            },
        }),
    })
}

/// Reports the configuration loaded at startup. Secrets are reduced to a
/// `password_set` flag.
pub async fn show_config(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ConfigResponse {
        source: state.config.source.as_str().to_string(),
        combiner: state.config.combiner.clone(),
        redis_settings: RedisSettingsView::from(&state.config.cache),
    })
}
