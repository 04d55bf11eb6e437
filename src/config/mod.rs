//! Configuration loading and validation.

pub mod loader;
pub mod types;

pub use loader::ConfigError;
pub use types::{Config, CsrfConfig, PrefetchConfig, ServerConfig, SyncConfig};
