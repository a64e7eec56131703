//! Uniform-Catalog main entry point
//!
//! This is the command-line interface for the school-uniform catalog crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uniform_catalog::adapter::{ListingSource, SiteAdapter};
use uniform_catalog::config::{load_config_with_hash, Config};
use uniform_catalog::output::{generate_markdown_summary, print_report, summary_path};
use uniform_catalog::{CatalogCrawler, CsvSink, Depth, HttpDriver, SiteRegistry};

/// Uniform-Catalog: a table-driven school-uniform catalog crawler
///
/// Walks a supplier's schools, their products and each product's size
/// options, writing one CSV file per tier as soon as the tier completes.
#[derive(Parser, Debug)]
#[command(name = "uniform-catalog")]
#[command(version)]
#[command(about = "School-uniform catalog crawler", long_about = None)]
struct Cli {
    /// Supplier to crawl (see --list)
    #[arg(value_name = "SUPPLIER", required_unless_present = "list")]
    supplier: Option<String>,

    /// Last tier to crawl
    #[arg(short, long, default_value = "schools", value_parser = parse_depth)]
    depth: Depth,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory for CSV exports and the summary (overrides the config)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Read products for at most N schools
    #[arg(long, value_name = "N")]
    limit_schools: Option<usize>,

    /// Read variants for at most N products
    #[arg(long, value_name = "N")]
    limit_products: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// List known suppliers and exit
    #[arg(long, conflicts_with = "dry_run")]
    list: bool,

    /// Validate the configuration and show what would be crawled
    #[arg(long)]
    dry_run: bool,
}

fn parse_depth(value: &str) -> Result<Depth, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = load(cli.config.as_deref())?;
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.display().to_string();
    }
    if cli.limit_schools.is_some() {
        config.crawl.max_schools = cli.limit_schools;
    }
    if cli.limit_products.is_some() {
        config.crawl.max_products = cli.limit_products;
    }

    let mut registry = SiteRegistry::builtin().context("Failed to load built-in suppliers")?;
    registry.extend(config.site.clone());

    if cli.list {
        handle_list(&registry);
        return Ok(());
    }

    let name = cli.supplier.as_deref().unwrap_or_default();
    let site = registry.get(name)?.clone();

    if cli.dry_run {
        handle_dry_run(&config, &site, cli.depth);
        return Ok(());
    }

    handle_crawl(config, config_hash, site, cli.depth).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("uniform_catalog=info,warn"),
            1 => EnvFilter::new("uniform_catalog=debug,info"),
            2 => EnvFilter::new("uniform_catalog=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<(Config, Option<String>)> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given; using defaults");
        return Ok((Config::default(), None));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok((config, Some(hash)))
}

/// Handles --list: prints every known supplier
fn handle_list(registry: &SiteRegistry) {
    println!("Known suppliers ({}):", registry.len());
    for site in registry.sites() {
        let deepest = match (&site.products, &site.variants) {
            (Some(_), Some(_)) => Depth::Variants,
            (Some(_), None) => Depth::Products,
            (None, _) => Depth::Schools,
        };
        println!("  {:<24} {} (to {})", site.name, site.display_name(), deepest);
    }
}

/// Handles --dry-run: shows the crawl plan without navigating
fn handle_dry_run(config: &Config, site: &SiteAdapter, depth: Depth) {
    println!("=== Uniform-Catalog Dry Run ===\n");

    println!("Supplier: {} ({})", site.name, site.display_name());
    println!("Requested depth: {}", depth);

    let source = match &site.schools.source {
        ListingSource::Fixed(url) => format!("fixed page {}", url),
        ListingSource::Urls(urls) => format!("{} category pages", urls.len()),
        ListingSource::Letters(template) => format!("26 letter pages from {}", template),
        ListingSource::Discovered { seed, .. } => format!("pages discovered from {}", seed),
        ListingSource::Entries(entries) => format!("{} declared entries", entries.len()),
    };
    println!("School source: {}", source);
    println!(
        "Product tier: {}",
        if site.products.is_some() { "yes" } else { "no" }
    );
    println!(
        "Variant tier: {}",
        if site.variants.is_some() { "yes" } else { "no" }
    );

    println!("\nCrawl Settings:");
    println!("  Max expansions: {}", config.crawl.max_expansions);
    println!("  Wait timeout: {}ms", config.crawl.wait_timeout_ms);
    println!("  Settle timeout: {}ms", config.crawl.settle_timeout_ms);
    println!("  Record policy: {:?}", config.crawl.record_policy);
    println!("  Option failure: {:?}", config.crawl.option_failure);
    if let Some(limit) = config.crawl.max_schools {
        println!("  School limit: {}", limit);
    }
    if let Some(limit) = config.crawl.max_products {
        println!("  Product limit: {}", limit);
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    if let Some(dir) = &config.output.snapshot_directory {
        println!("  Snapshots: {}", dir);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    site: SiteAdapter,
    depth: Depth,
) -> Result<()> {
    tracing::info!("Crawling '{}' to depth {}", site.name, depth);

    let mut driver = HttpDriver::new(&config.driver).context("Failed to build HTTP client")?;
    let output_dir = PathBuf::from(&config.output.directory);
    let mut sink = CsvSink::new(&output_dir);

    let mut crawler = CatalogCrawler::from_config(site, &config);
    if let Some(hash) = config_hash {
        crawler = crawler.with_config_hash(hash);
    }

    let output = match crawler.crawl(&mut driver, &mut sink, depth).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&output.report);

    if config.output.summary {
        let path = summary_path(&output_dir, &output.report.supplier);
        generate_markdown_summary(&output.report, &path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        println!("✓ Summary written to: {}", path.display());
    }

    Ok(())
}
