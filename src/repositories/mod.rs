pub mod cache_backend;
pub mod redis_repo;

pub use cache_backend::*;
pub use redis_repo::*;
