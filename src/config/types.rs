use crate::adapter::SiteAdapter;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Uniform-Catalog
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Additional site adapters; a name matching a built-in replaces it
    #[serde(default)]
    pub site: Vec<SiteAdapter>,
}

/// What happens to a record whose required field cannot be extracted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordPolicy {
    /// Drop the record; it consumes no id
    #[default]
    Skip,

    /// Keep the record with the failed fields left empty
    NullPad,
}

/// What happens to a size option whose selection or extraction fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionFailurePolicy {
    /// Emit an empty variant so every option keeps its row
    #[default]
    Placeholder,

    /// Emit nothing for the option
    Skip,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Upper bound on load-more clicks, scrolls or next-page hops per listing
    #[serde(rename = "max-expansions", default = "default_max_expansions")]
    pub max_expansions: u32,

    /// Bounded wait for an element to appear (milliseconds)
    #[serde(rename = "wait-timeout-ms", default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Interval between condition checks while waiting (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bounded wait for the price to update after choosing an option (milliseconds)
    #[serde(rename = "settle-timeout-ms", default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    #[serde(rename = "record-policy", default)]
    pub record_policy: RecordPolicy,

    #[serde(rename = "option-failure", default)]
    pub option_failure: OptionFailurePolicy,

    /// Only the first N schools are walked for products
    #[serde(rename = "max-schools", default)]
    pub max_schools: Option<usize>,

    /// Only the first N products are walked for variants
    #[serde(rename = "max-products", default)]
    pub max_products: Option<usize>,
}

impl CrawlSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_expansions: default_max_expansions(),
            wait_timeout_ms: default_wait_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_timeout_ms: default_settle_timeout_ms(),
            record_policy: RecordPolicy::default(),
            option_failure: OptionFailurePolicy::default(),
            max_schools: None,
            max_products: None,
        }
    }
}

/// Page driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    /// User-Agent header sent with every page request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving `<supplier>_<tier>.csv`
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Directory receiving page snapshots of products without a size control
    #[serde(rename = "snapshot-directory", default)]
    pub snapshot_directory: Option<String>,

    /// Write `<supplier>_summary.md` next to the exports
    #[serde(default = "default_summary")]
    pub summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            snapshot_directory: None,
            summary: default_summary(),
        }
    }
}

fn default_max_expansions() -> u32 {
    50
}

fn default_wait_timeout_ms() -> u64 {
    2000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_settle_timeout_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; uniform-catalog/{})",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_output_directory() -> String {
    "./output".to_string()
}

fn default_summary() -> bool {
    true
}
