//! Crawler module for the three-tier catalog walk
//!
//! This module contains the core crawling logic, including:
//! - Tier orchestration and per-tier checkpoint exports
//! - Listing sources, preparation actions and expansion
//! - Field extraction with per-record skip or pad policies
//! - Size option enumeration on product pages

mod coordinator;
mod extract;
mod listing;
mod variants;

pub use coordinator::{CatalogCrawler, CatalogOutput};
pub use extract::{Extraction, FieldError, SkipReason};
