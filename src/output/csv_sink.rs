//! CSV export sink

use crate::catalog::Tier;
use crate::output::traits::{table_name, ExportSink, OutputResult};
use serde::Serialize;
use std::path::PathBuf;

/// Writes each tier to `<directory>/<supplier>_<tier>.csv`, overwriting any
/// earlier export of the same table
#[derive(Debug, Clone)]
pub struct CsvSink {
    directory: PathBuf,
}

impl CsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the file a tier export is written to
    pub fn path_for(&self, supplier: &str, tier: Tier) -> PathBuf {
        self.directory
            .join(format!("{}.csv", table_name(supplier, tier)))
    }
}

impl ExportSink for CsvSink {
    fn export<T: Serialize>(
        &mut self,
        supplier: &str,
        tier: Tier,
        records: &[T],
    ) -> OutputResult<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(supplier, tier);

        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!("Exported {} {} to {}", records.len(), tier, path.display());
        Ok(())
    }
}
