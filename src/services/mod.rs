pub mod cache_service;
pub mod combiner_service;
pub mod composer;

pub use cache_service::*;
pub use combiner_service::*;
