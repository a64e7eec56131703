//! Site adapters
//!
//! A site adapter is the per-supplier table describing how to reach each
//! tier's listing and which selectors extract each field. Adapters are plain
//! data deserialized from TOML; the crawler is the only code that interprets
//! them.
//!
//! # Example
//!
//! ```no_run
//! use uniform_catalog::adapter::SiteRegistry;
//!
//! let registry = SiteRegistry::builtin().unwrap();
//! let site = registry.get("monkhouse").unwrap();
//! println!("Scraping {}", site.display_name());
//! ```

mod registry;
mod types;

pub use registry::{SiteFile, SiteRegistry};
pub use types::{
    Action, Expansion, Extract, FieldRule, Interaction, ListRule, Listing, ListingEntry,
    ListingSource, ProductTier, SchoolTier, SiteAdapter, VariantTier,
};
