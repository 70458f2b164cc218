pub mod json_errors;

pub use json_errors::json_errors;
