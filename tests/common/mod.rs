#![allow(dead_code)]

use actix_web::{web, App, HttpResponse};
use anyhow::Result;
use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image_combiner::config::{CombinerConfig, Config, ConfigSource};
use image_combiner::repositories::CacheBackend;
use image_combiner::services::{CacheService, CombinerService};
use image_combiner::AppState;

/// In-process stand-in for Redis. TTLs are recorded but not enforced.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    ttls: Mutex<HashMap<String, u64>>,
}

impl MemoryBackend {
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.ttls.lock().unwrap().get(key).copied()
    }

    pub fn insert_raw(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        self.ttls
            .lock()
            .unwrap()
            .insert(key.to_string(), ttl_seconds);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn count_prefix(&self, prefix: &str) -> Result<u64> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.keys().filter(|key| key.starts_with(prefix)).count() as u64)
    }

    async fn memory_usage(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
    buffer.into_inner()
}

fn transparent_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// Serves generated images over real HTTP and counts every download.
pub struct ImageServer {
    pub server: actix_test::TestServer,
    pub hits: Arc<AtomicUsize>,
}

impl ImageServer {
    pub fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let server = actix_test::start(move || {
            App::new()
                .app_data(web::Data::new(counter.clone()))
                .route("/png/{w}/{h}", web::get().to(serve_png))
                .route("/jpeg/{w}/{h}", web::get().to(serve_jpeg))
                .route("/transparent.png", web::get().to(serve_transparent))
                .route("/not-an-image", web::get().to(serve_text))
                .route("/missing", web::get().to(serve_missing))
        });

        Self { server, hits }
    }

    pub fn url(&self, path: &str) -> String {
        self.server.url(path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_png(counter: web::Data<Arc<AtomicUsize>>, size: web::Path<(u32, u32)>) -> HttpResponse {
    counter.fetch_add(1, Ordering::SeqCst);
    let (w, h) = size.into_inner();
    let img = RgbImage::from_pixel(w, h, Rgb([220, 40, 40]));
    HttpResponse::Ok().content_type("image/png").body(png_bytes(&img))
}

async fn serve_jpeg(counter: web::Data<Arc<AtomicUsize>>, size: web::Path<(u32, u32)>) -> HttpResponse {
    counter.fetch_add(1, Ordering::SeqCst);
    let (w, h) = size.into_inner();
    let img = RgbImage::from_pixel(w, h, Rgb([40, 40, 220]));
    HttpResponse::Ok().content_type("image/jpeg").body(jpeg_bytes(&img))
}

async fn serve_transparent(counter: web::Data<Arc<AtomicUsize>>) -> HttpResponse {
    counter.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok().content_type("image/png").body(transparent_png())
}

async fn serve_text(counter: web::Data<Arc<AtomicUsize>>) -> HttpResponse {
    counter.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok().content_type("text/html").body("<html>hello</html>")
}

async fn serve_missing(counter: web::Data<Arc<AtomicUsize>>) -> HttpResponse {
    counter.fetch_add(1, Ordering::SeqCst);
    HttpResponse::NotFound().body("gone")
}

pub fn test_config(combiner: CombinerConfig) -> Config {
    Config {
        combiner,
        source: ConfigSource::Environment,
        ..Config::default()
    }
}

pub fn state_with_backend(combiner: CombinerConfig, backend: Arc<MemoryBackend>) -> AppState {
    let config = test_config(combiner.clone());
    let cache = CacheService::with_backend(backend, config.cache.ttl_seconds);
    AppState::new(config, CombinerService::new(combiner).unwrap(), cache)
}

pub fn state_without_cache(combiner: CombinerConfig) -> AppState {
    let mut config = test_config(combiner.clone());
    config.cache.enabled = false;
    AppState::new(
        config,
        CombinerService::new(combiner).unwrap(),
        CacheService::disabled(),
    )
}

/// Same route table and default service as the binary.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .app_data(actix_web::web::PayloadConfig::new(
                    image_combiner::config::ServerConfig::default().max_payload_size,
                ))
                .wrap(image_combiner::middleware::json_errors())
                .configure(image_combiner::routes::api::config)
                .default_service(
                    actix_web::web::route().to(image_combiner::handlers::health::not_found),
                ),
        )
        .await
    };
}
