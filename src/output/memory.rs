//! In-memory export sink

use crate::catalog::Tier;
use crate::output::traits::{table_name, ExportSink, OutputError, OutputResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// Keeps every exported table in memory as JSON rows
///
/// Useful for embedding the crawler and for observing the order in which
/// tiers are checkpointed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: BTreeMap<String, Vec<serde_json::Value>>,
    order: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of a table, if it was exported
    pub fn table(&self, supplier: &str, tier: Tier) -> Option<&[serde_json::Value]> {
        self.tables
            .get(&table_name(supplier, tier))
            .map(Vec::as_slice)
    }

    /// Table names in the order they were exported
    pub fn export_order(&self) -> &[String] {
        &self.order
    }
}

impl ExportSink for MemorySink {
    fn export<T: Serialize>(
        &mut self,
        supplier: &str,
        tier: Tier,
        records: &[T],
    ) -> OutputResult<()> {
        let rows = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| OutputError::Format(e.to_string()))?;

        let name = table_name(supplier, tier);
        self.order.push(name.clone());
        self.tables.insert(name, rows);
        Ok(())
    }
}
