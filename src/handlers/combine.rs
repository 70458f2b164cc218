use actix_web::{http::header, web, HttpMessage, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::error::AppError;
use crate::models::CombineResponse;
use crate::utils::{combination_digest, strip_namespace};
use crate::AppState;

pub async fn combine(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let config = state.combiner.config();
    let urls = parse_urls(http_req.content_type(), &body, config.max_images)?;

    if let Some(image) = state.cache.get(&urls, config).await {
        let key = combination_digest(&urls, config);
        tracing::info!("Serving {} URLs from cache ({})", urls.len(), key);
        return Ok(HttpResponse::Ok().json(envelope(key, image.len(), urls.len(), true)));
    }

    let image = state.combiner.combine(&urls).await.map_err(|e| {
        tracing::error!("Combine failed: {}", e);
        e
    })?;

    match state.cache.put(&urls, config, &image).await {
        Some(key) => {
            let key = strip_namespace(&key).to_string();
            Ok(HttpResponse::Ok().json(envelope(key, image.len(), urls.len(), false)))
        }
        // Nowhere to retrieve from later, so hand the image over directly.
        None => Ok(HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header(("X-Cache", "BYPASS"))
            .insert_header((
                header::CONTENT_DISPOSITION,
                "inline; filename=\"combined_image.jpg\"",
            ))
            .body(image)),
    }
}

fn envelope(key: String, image_size: usize, urls_count: usize, cached: bool) -> CombineResponse {
    CombineResponse {
        success: true,
        retrieve_url: format!("/image/{}", key),
        key,
        image_size,
        urls_count,
        cached,
    }
}

/// Validates a `/combine` body, checking each constraint in turn so the
/// error names the first one violated.
pub fn parse_urls(content_type: &str, body: &[u8], max_images: usize) -> Result<Vec<String>, AppError> {
    if !is_json(content_type) {
        return Err(AppError::validation("Content-Type must be application/json"));
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Request body must be valid JSON: {}", e)))?;

    let urls = payload
        .get("urls")
        .ok_or_else(|| AppError::validation("Parameter \"urls\" is required"))?;
    let urls = urls
        .as_array()
        .ok_or_else(|| AppError::validation("Parameter \"urls\" must be a list"))?;

    if urls.is_empty() {
        return Err(AppError::validation("URL list must not be empty"));
    }
    if urls.len() > max_images {
        return Err(AppError::validation(format!(
            "At most {} URLs are allowed, got {}",
            max_images,
            urls.len()
        )));
    }

    urls.iter()
        .map(|value| {
            let url = value
                .as_str()
                .ok_or_else(|| AppError::validation("Every entry in \"urls\" must be a string"))?;
            match reqwest::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url.to_string()),
                _ => Err(AppError::validation(format!("Invalid image URL: {}", url))),
            }
        })
        .collect()
}

fn is_json(content_type: &str) -> bool {
    let mime = content_type.trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = "application/json";

    fn message(result: Result<Vec<String>, AppError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn accepts_valid_request() {
        let body = br#"{"urls": ["http://x/a.jpg", "https://x/b.png"]}"#;
        let urls = parse_urls(JSON, body, 4).unwrap();
        assert_eq!(urls, vec!["http://x/a.jpg", "https://x/b.png"]);
    }

    #[test]
    fn rejects_non_json_content_type() {
        let body = br#"{"urls": ["http://x/a.jpg"]}"#;
        assert!(message(parse_urls("text/plain", body, 4)).contains("application/json"));
        assert!(message(parse_urls("", body, 4)).contains("application/json"));
    }

    #[test]
    fn each_constraint_has_its_own_message() {
        assert!(message(parse_urls(JSON, b"{not json", 4)).contains("valid JSON"));
        assert!(message(parse_urls(JSON, b"{}", 4)).contains("required"));
        assert!(message(parse_urls(JSON, br#"{"urls": "http://x"}"#, 4)).contains("list"));
        assert!(message(parse_urls(JSON, br#"{"urls": []}"#, 4)).contains("empty"));
        assert!(message(parse_urls(JSON, br#"{"urls": [1]}"#, 4)).contains("string"));
        assert!(message(parse_urls(JSON, br#"{"urls": ["ftp://x/a"]}"#, 4)).contains("ftp://x/a"));
        assert!(message(parse_urls(JSON, br#"{"urls": ["a.jpg"]}"#, 4)).contains("a.jpg"));
    }

    #[test]
    fn rejects_more_than_max_images() {
        let body = br#"{"urls": ["http://x/1", "http://x/2", "http://x/3"]}"#;
        let err = message(parse_urls(JSON, body, 2));
        assert!(err.contains("At most 2"));
        assert!(parse_urls(JSON, body, 3).is_ok());
    }

    #[test]
    fn json_suffix_types_are_accepted() {
        let body = br#"{"urls": ["http://x/a.jpg"]}"#;
        assert!(parse_urls("application/vnd.api+json", body, 4).is_ok());
    }

    #[test]
    fn content_type_check_ignores_case() {
        let body = br#"{"urls": ["http://x/a.jpg"]}"#;
        assert!(parse_urls("Application/JSON", body, 4).is_ok());
        assert!(parse_urls("APPLICATION/VND.API+JSON", body, 4).is_ok());
        assert!(parse_urls("text/x+json", body, 4).is_err());
    }
}
