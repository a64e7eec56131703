//! Run report
//!
//! Collects per-tier counters while a crawl runs. The crawler fills it in;
//! the CLI prints it and renders it as markdown.

use crate::catalog::{Depth, Tier};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Counters for one tier of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierReport {
    pub tier: Tier,

    /// Records written to the sink
    pub exported: usize,

    /// Records (or options) dropped, by reason kind
    pub skip_reasons: BTreeMap<String, usize>,

    /// Records kept with one or more required fields left empty
    pub padded: usize,

    /// Placeholder variants emitted for failed options
    pub placeholders: usize,

    /// Expansion attempts across every listing page of the tier
    pub expansions: u32,

    /// Set when a missing listing container cut the tier short
    pub aborted: bool,
}

impl TierReport {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            exported: 0,
            skip_reasons: BTreeMap::new(),
            padded: 0,
            placeholders: 0,
            expansions: 0,
            aborted: false,
        }
    }

    /// Tallies one skip under `kind`
    pub fn record_skip(&mut self, kind: &str) {
        *self.skip_reasons.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Total number of skips across all reasons
    pub fn skipped(&self) -> usize {
        self.skip_reasons.values().sum()
    }
}

/// Summary of one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub supplier: String,
    pub depth: Depth,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config_hash: Option<String>,
    pub tiers: Vec<TierReport>,
}

impl CrawlReport {
    /// Starts a report stamped with the current time
    pub fn new(supplier: &str, depth: Depth) -> Self {
        Self {
            supplier: supplier.to_string(),
            depth,
            started_at: Utc::now(),
            finished_at: None,
            config_hash: None,
            tiers: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Report for `tier`, if the crawl reached it
    pub fn tier(&self, tier: Tier) -> Option<&TierReport> {
        self.tiers.iter().find(|report| report.tier == tier)
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// True if any tier was cut short
    pub fn any_aborted(&self) -> bool {
        self.tiers.iter().any(|report| report.aborted)
    }
}
