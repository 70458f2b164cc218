use crate::handlers;
use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::service_info))
        .route("/health", web::get().to(handlers::health_check))
        .route("/config", web::get().to(handlers::show_config))
        .route("/combine", web::post().to(handlers::combine))
        .route("/image/{key}", web::get().to(handlers::get_image))
        .route("/cache/stats", web::get().to(handlers::cache_stats))
        .route("/cache/clear", web::post().to(handlers::clear_cache));
}
