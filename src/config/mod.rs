//! Configuration module
//!
//! This module handles loading TOML configuration files, applying process
//! environment overrides and validating the result.
//!
//! # Example
//!
//! ```no_run
//! use seo_crawler::config::load_effective_config;
//! use std::path::Path;
//!
//! let (config, _hash) = load_effective_config(Some(Path::new("crawler.toml"))).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, QueueConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    load_effective_config,
};
pub use validation::validate;
