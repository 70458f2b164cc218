pub mod compression;
pub mod hashing;
pub mod layout;

pub use compression::*;
pub use hashing::*;
pub use layout::*;
