//! Export sink trait and error types
//!
//! A sink receives each tier's records exactly once, as soon as the tier
//! completes.

use crate::catalog::Tier;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for per-tier exports
pub trait ExportSink {
    /// Writes one tier's complete record set
    ///
    /// # Arguments
    ///
    /// * `supplier` - The supplier name, used to name the table
    /// * `tier` - The tier the records belong to
    /// * `records` - The accepted records, in id order
    fn export<T: Serialize>(&mut self, supplier: &str, tier: Tier, records: &[T])
        -> OutputResult<()>;
}

/// Name of the table holding `tier` for `supplier`, e.g. `monkhouse_products`
pub fn table_name(supplier: &str, tier: Tier) -> String {
    format!("{}_{}", supplier, tier.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name() {
        assert_eq!(table_name("monkhouse", Tier::Schools), "monkhouse_schools");
        assert_eq!(table_name("asda", Tier::Variants), "asda_variants");
    }
}
