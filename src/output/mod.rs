//! Output module for tier exports and run summaries
//!
//! This module handles:
//! - Exporting each tier's records through an `ExportSink`
//! - Collecting per-tier counters in a `CrawlReport`
//! - Rendering the report as a markdown summary

mod csv_sink;
mod markdown;
mod memory;
mod report;
mod traits;

pub use csv_sink::CsvSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use memory::MemorySink;
pub use report::{CrawlReport, TierReport};
pub use traits::{table_name, ExportSink, OutputError, OutputResult};

use std::path::{Path, PathBuf};

/// Path of the markdown summary for `supplier` under `directory`
pub fn summary_path(directory: &Path, supplier: &str) -> PathBuf {
    directory.join(format!("{}_summary.md", supplier))
}

/// Prints a short report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== {} ({}) ===", report.supplier, report.depth);
    for tier in &report.tiers {
        print!(
            "{:<9} exported {:>6}  skipped {:>5}",
            tier.tier.as_str(),
            tier.exported,
            tier.skipped()
        );
        if tier.placeholders > 0 {
            print!("  placeholders {}", tier.placeholders);
        }
        if tier.aborted {
            print!("  (aborted)");
        }
        println!();
    }
    if let Some(duration) = report.duration_seconds() {
        println!("Finished in {}s", duration);
    }
}
