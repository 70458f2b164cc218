pub mod cache;
pub mod combine;
pub mod health;
pub mod info;
pub mod retrieve;

pub use cache::*;
pub use combine::*;
pub use health::*;
pub use info::*;
pub use retrieve::*;
