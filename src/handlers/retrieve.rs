use actix_web::{http::header, web, HttpResponse, Result};

use crate::models::ImageNotFoundResponse;
use crate::utils::strip_namespace;
use crate::AppState;

pub async fn get_image(state: web::Data<AppState>, key: web::Path<String>) -> Result<HttpResponse> {
    let key = key.into_inner();

    match state.cache.get_by_key(&key).await {
        Some(image) => Ok(HttpResponse::Ok()
            .content_type("image/jpeg")
            .insert_header(("X-Cache", "HIT"))
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}.jpg\"", strip_namespace(&key)),
            ))
            .body(image)),
        None => Ok(HttpResponse::NotFound().json(ImageNotFoundResponse {
            error: "Image not found or expired".to_string(),
            message: format!(
                "No cached image for this key. Cached images expire after {} seconds; \
                 POST /combine again to regenerate it.",
                state.cache.ttl_seconds()
            ),
            key,
        })),
    }
}
