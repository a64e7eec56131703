//! Uniform-Catalog: a table-driven school-uniform catalog crawler
//!
//! This crate walks supplier websites in three nested tiers (schools,
//! products, size variants), exporting one table per tier as soon as that
//! tier completes.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod driver;
pub mod output;

use thiserror::Error;

/// Main error type for Uniform-Catalog operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown supplier '{name}' (known suppliers: {known})")]
    UnknownSupplier { name: String, known: String },

    #[error("Export error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in site '{site}': {selector}")]
    InvalidSelector { site: String, selector: String },

    #[error("Invalid pattern in site '{site}': {message}")]
    InvalidPattern { site: String, message: String },
}

/// Result type alias for Uniform-Catalog operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapter::{SiteAdapter, SiteRegistry};
pub use catalog::{Depth, Product, School, Variant};
pub use config::Config;
pub use crawler::{CatalogCrawler, CatalogOutput};
pub use driver::{Driver, HttpDriver};
pub use output::{CrawlReport, CsvSink, ExportSink, MemorySink};
