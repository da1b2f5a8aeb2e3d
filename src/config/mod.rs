//! Configuration module for Job-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file) is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use job_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("job-scout.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, ConverterConfig, CrawlerConfig, OracleConfig, OutputConfig,
    PacingConfig, RetryConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_or_default, load_config_with_hash, parse_config,
};
pub use validation::validate;
