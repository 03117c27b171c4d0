//! Configuration module for Sumi-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Idle window: {:?}", config.crawler.idle_timeout());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CompletionMode, Config, CrawlerConfig, OutputConfig, StorageConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
