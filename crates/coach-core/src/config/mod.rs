//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use coach_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Endpoint: {}", cfg.provider.normalized_endpoint());
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{normalize_endpoint, Config, GenerationConfig, ProviderConfig, RetryConfig};
