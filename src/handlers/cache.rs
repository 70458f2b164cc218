use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::models::CacheClearResponse;
use crate::AppState;

pub async fn cache_stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.cache.stats().await)
}

pub async fn clear_cache(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let deleted = state.cache.clear().await?;

    Ok(HttpResponse::Ok().json(CacheClearResponse {
        success: true,
        deleted,
        message: format!("Removed {} cached images", deleted),
    }))
}
