use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_combiner::config::Config;
use image_combiner::handlers::health::not_found;
use image_combiner::middleware::json_errors;
use image_combiner::routes::api;
use image_combiner::services::{CacheService, CombinerService};
use image_combiner::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::load() {
        Ok(config) => {
            info!("Configuration loaded from {}", config.source.as_str());
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Combiner: max {} images, quality {}, cells {}x{}, timeout {}s",
        config.combiner.max_images,
        config.combiner.image_quality,
        config.combiner.cell_width,
        config.combiner.cell_height,
        config.combiner.timeout_seconds
    );
    info!(
        "Cache: enabled={}, required={}, redis={}:{}, ttl={}s",
        config.cache.enabled,
        config.cache.required,
        config.cache.redis_host,
        config.cache.redis_port,
        config.cache.ttl_seconds
    );

    // A required cache that cannot be reached stops startup here.
    let cache_service = match CacheService::from_settings(&config.cache).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize cache service: {:#}", e);
            std::process::exit(1);
        }
    };
    let combiner = match CombinerService::new(config.combiner.clone()) {
        Ok(combiner) => combiner,
        Err(e) => {
            error!("Failed to build HTTP client: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(config.clone(), combiner, cache_service);

    if std::env::var("HASSIO_TOKEN").is_ok() {
        info!("Running as Home Assistant add-on");
    }

    // Create HTTP server
    let max_payload_size = config.server.max_payload_size;
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(max_payload_size))
            .wrap(json_errors())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(api::config)
            .default_service(web::route().to(not_found))
    })
    .bind((config.server.host.as_str(), config.server.port))?;

    info!(
        "Server started successfully at http://{}:{}",
        config.server.host, config.server.port
    );

    // Run the server
    server.workers(config.server.workers).run().await
}
