// Public modules
pub mod cargo;
pub mod config;
pub mod error;
pub mod file_swap;
pub mod helm;
pub mod python;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use config::Settings;
pub use error::{Error, ErrorCode, Result};
