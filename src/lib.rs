pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;

use std::time::Instant;

use crate::config::Config;
use crate::services::{CacheService, CombinerService};

/// Everything a request handler needs, built once at startup and cloned
/// into each worker.
#[derive(Clone)]
pub struct AppState {
    pub combiner: CombinerService,
    pub cache: CacheService,
    pub config: Config,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, combiner: CombinerService, cache: CacheService) -> Self {
        Self {
            combiner,
            cache,
            config,
            start_time: Instant::now(),
        }
    }
}
