//! Markdown summary generation
//!
//! This module renders a crawl report as a human-readable markdown file:
//! run information, per-tier counts and skip reasons.

use crate::output::report::CrawlReport;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a crawl report
///
/// # Arguments
///
/// * `report` - The finished crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(report);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
///
/// # Arguments
///
/// * `report` - The crawl report
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(report: &CrawlReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Catalog Crawl Summary: {}\n\n", report.supplier));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Supplier**: {}\n", report.supplier));
    md.push_str(&format!("- **Depth**: {}\n", report.depth));
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if report.any_aborted() {
        "partial"
    } else {
        "completed"
    };
    md.push_str(&format!("- **Status**: {}\n", status));
    if let Some(hash) = &report.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Tier breakdown
    md.push_str("## Tiers\n\n");
    md.push_str("| Tier | Exported | Skipped | Padded | Placeholders | Expansions | Aborted |\n");
    md.push_str("|------|----------|---------|--------|--------------|------------|---------|\n");
    for tier in &report.tiers {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            tier.tier,
            tier.exported,
            tier.skipped(),
            tier.padded,
            tier.placeholders,
            tier.expansions,
            if tier.aborted { "yes" } else { "no" }
        ));
    }
    md.push('\n');

    // Skip reasons
    let with_skips: Vec<_> = report
        .tiers
        .iter()
        .filter(|tier| !tier.skip_reasons.is_empty())
        .collect();
    if !with_skips.is_empty() {
        md.push_str("## Skip Reasons\n\n");
        md.push_str("| Tier | Reason | Count |\n");
        md.push_str("|------|--------|-------|\n");

        for tier in with_skips {
            for (reason, count) in &tier.skip_reasons {
                md.push_str(&format!("| {} | {} | {} |\n", tier.tier, reason, count));
            }
        }
        md.push('\n');
    }

    md
}
