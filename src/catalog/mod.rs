//! Catalog data model
//!
//! The three strictly nested tiers a crawl produces, and the scoped id
//! sequence each tier draws from.
//!
//! # Components
//!
//! - `Tier` / `Depth`: which level of the catalog a crawl stops at
//! - `School`, `Product`, `Variant`: one exported row per record
//! - `IdSequence`: per-tier id counter owned by a single crawl invocation

mod records;
mod sequence;

pub use records::{Depth, Product, School, Tier, Variant};
pub use sequence::IdSequence;
