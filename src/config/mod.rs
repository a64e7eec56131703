//! Configuration module for Uniform-Catalog
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a run without a config file uses
//! `Config::default()` and the built-in supplier table.
//!
//! # Example
//!
//! ```no_run
//! use uniform_catalog::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Expansion attempts per listing: {}", config.crawl.max_expansions);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlSettings, DriverConfig, OptionFailurePolicy, OutputConfig, RecordPolicy};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Site validation is shared with the built-in registry
pub use validation::{validate, validate_site};
