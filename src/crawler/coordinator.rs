//! Crawl coordinator - tier orchestration
//!
//! This module walks the three catalog tiers in order:
//! - Reads schools from the adapter's listing source
//! - Reads each school's products from its store page
//! - Reads each product's size options from its detail page
//!
//! Each tier is exported as soon as it completes, before the next tier
//! starts, and the walk stops at the requested depth.

use crate::adapter::{ListingSource, ProductTier, SchoolTier, SiteAdapter, VariantTier};
use crate::catalog::{Depth, IdSequence, Product, School, Tier, Variant};
use crate::config::{Config, CrawlSettings};
use crate::crawler::extract::{Extraction, FieldReader, Fields};
use crate::driver::Driver;
use crate::output::{CrawlReport, ExportSink, TierReport};
use crate::HarvestError;
use std::path::{Path, PathBuf};

/// Records collected by one crawl invocation
#[derive(Debug, Clone)]
pub struct CatalogOutput {
    /// Always present, possibly empty
    pub schools: Vec<School>,
    /// Present when the depth reached the product tier
    pub products: Option<Vec<Product>>,
    /// Present when the depth reached the variant tier
    pub variants: Option<Vec<Variant>>,
    pub report: CrawlReport,
}

/// Three-tier catalog crawler for one supplier
///
/// # Example
///
/// ```no_run
/// use uniform_catalog::config::CrawlSettings;
/// use uniform_catalog::driver::HttpDriver;
/// use uniform_catalog::{CatalogCrawler, CsvSink, Depth, SiteRegistry};
///
/// # async fn run() -> Result<(), uniform_catalog::HarvestError> {
/// let registry = SiteRegistry::builtin()?;
/// let site = registry.get("monkhouse")?.clone();
/// let crawler = CatalogCrawler::new(site, CrawlSettings::default());
///
/// let mut driver = HttpDriver::new(&Default::default())?;
/// let mut sink = CsvSink::new("./output");
/// let output = crawler.crawl(&mut driver, &mut sink, Depth::Products).await?;
/// println!("{} schools", output.schools.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalogCrawler {
    site: SiteAdapter,
    settings: CrawlSettings,
    snapshot_dir: Option<PathBuf>,
    config_hash: Option<String>,
}

impl CatalogCrawler {
    /// Creates a crawler for `site`
    pub fn new(site: SiteAdapter, settings: CrawlSettings) -> Self {
        Self {
            site,
            settings,
            snapshot_dir: None,
            config_hash: None,
        }
    }

    /// Creates a crawler using the crawl and output sections of `config`
    pub fn from_config(site: SiteAdapter, config: &Config) -> Self {
        Self::new(site, config.crawl.clone())
            .with_snapshot_dir(config.output.snapshot_directory.as_ref().map(PathBuf::from))
    }

    /// Directory receiving page snapshots of products without an option control
    pub fn with_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Hash of the configuration, recorded in the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn site(&self) -> &SiteAdapter {
        &self.site
    }

    /// Deepest tier the adapter describes, capped at `depth`
    pub fn effective_depth(&self, depth: Depth) -> Depth {
        let deepest = match (&self.site.products, &self.site.variants) {
            (Some(_), Some(_)) => Tier::Variants,
            (Some(_), None) => Tier::Products,
            (None, _) => Tier::Schools,
        };
        depth.min(deepest)
    }

    /// Runs the crawl down to `depth`
    ///
    /// # Arguments
    ///
    /// * `driver` - The page session, exclusively borrowed for the whole run
    /// * `sink` - Receives each tier's records as soon as the tier completes
    /// * `depth` - The last tier to crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogOutput)` - The collected tiers and the run report; element
    ///   and page failures are tallied in the report rather than returned
    /// * `Err(HarvestError)` - A tier could not be exported
    pub async fn crawl<D: Driver, S: ExportSink>(
        &self,
        driver: &mut D,
        sink: &mut S,
        depth: Depth,
    ) -> Result<CatalogOutput, HarvestError> {
        let supplier = self.site.name.as_str();
        let mut report = CrawlReport::new(supplier, depth);
        report.config_hash = self.config_hash.clone();

        let effective = self.effective_depth(depth);
        if effective < depth {
            tracing::warn!(
                "Site '{}' describes no tiers beyond {}; stopping there",
                supplier,
                effective
            );
        }

        let mut walker = Walker {
            driver,
            site: &self.site,
            settings: &self.settings,
            snapshot_dir: self.snapshot_dir.as_deref(),
            fields: FieldReader::new(self.settings.record_policy),
        };

        // Schools
        let mut tier_report = TierReport::new(Tier::Schools);
        let schools = walker.schools(&self.site.schools, &mut tier_report).await;
        checkpoint(sink, supplier, &schools, tier_report, &mut report)?;

        // Products
        let mut products = None;
        if effective.includes(Tier::Products) {
            if let Some(rules) = &self.site.products {
                let mut tier_report = TierReport::new(Tier::Products);
                let collected = walker.products(rules, &schools, &mut tier_report).await;
                checkpoint(sink, supplier, &collected, tier_report, &mut report)?;
                products = Some(collected);
            }
        }

        // Variants
        let mut variants = None;
        if effective.includes(Tier::Variants) {
            if let (Some(rules), Some(products)) = (&self.site.variants, &products) {
                let mut tier_report = TierReport::new(Tier::Variants);
                let collected = walker.variants(rules, products, &mut tier_report).await;
                checkpoint(sink, supplier, &collected, tier_report, &mut report)?;
                variants = Some(collected);
            }
        }

        report.finish();
        Ok(CatalogOutput {
            schools,
            products,
            variants,
            report,
        })
    }
}

/// Exports a finished tier and files its report
fn checkpoint<S: ExportSink, T: serde::Serialize>(
    sink: &mut S,
    supplier: &str,
    records: &[T],
    mut tier_report: TierReport,
    report: &mut CrawlReport,
) -> Result<(), HarvestError> {
    sink.export(supplier, tier_report.tier, records)?;
    tier_report.exported = records.len();

    tracing::info!(
        "Finished {} for '{}': {} exported, {} skipped{}",
        tier_report.tier,
        supplier,
        tier_report.exported,
        tier_report.skipped(),
        if tier_report.aborted { " (aborted)" } else { "" }
    );

    report.tiers.push(tier_report);
    Ok(())
}

/// State of one crawl invocation: the borrowed session and the field reader
pub(crate) struct Walker<'a, D: Driver> {
    pub(super) driver: &'a mut D,
    pub(super) site: &'a SiteAdapter,
    pub(super) settings: &'a CrawlSettings,
    pub(super) snapshot_dir: Option<&'a Path>,
    pub(super) fields: FieldReader,
}

impl<D: Driver> Walker<'_, D> {
    /// Reads the school tier
    async fn schools(&mut self, rules: &SchoolTier, report: &mut TierReport) -> Vec<School> {
        tracing::info!("Reading schools for '{}'", self.site.name);
        let mut ids = IdSequence::new();
        let mut schools = Vec::new();

        if let ListingSource::Entries(entries) = &rules.source {
            for entry in entries {
                schools.push(School {
                    id: ids.next_id(),
                    name: Some(entry.name.clone()),
                    store_page: Some(entry.url.clone()),
                    urn: None,
                });
            }
            return schools;
        }

        let Some(listing) = &rules.listing else {
            tracing::error!("Site '{}' has no school listing", self.site.name);
            report.aborted = true;
            return schools;
        };

        let pages = self.listing_pages(&rules.source, report).await;
        for page in pages {
            let mut specs = vec![
                ("name", &rules.name),
                ("store_page", &rules.store_page),
            ];
            if let Some(urn) = &rules.urn {
                specs.push(("urn", urn));
            }

            let read = self.read_listing(&page, listing, &specs, report).await;
            for extraction in read.records {
                let mut fields = match accept(extraction, report, &page) {
                    Some(fields) => fields,
                    None => continue,
                };
                schools.push(School {
                    id: ids.next_id(),
                    name: fields.take("name"),
                    store_page: fields.take("store_page"),
                    urn: fields.take("urn"),
                });
            }

            if read.aborted {
                report.aborted = true;
                break;
            }
        }

        schools
    }

    /// Reads the product tier from each school's store page
    async fn products(
        &mut self,
        rules: &ProductTier,
        schools: &[School],
        report: &mut TierReport,
    ) -> Vec<Product> {
        let limit = self.settings.max_schools.unwrap_or(usize::MAX);
        tracing::info!(
            "Reading products for {} schools",
            schools.len().min(limit)
        );

        let mut ids = IdSequence::new();
        let mut products = Vec::new();

        let mut specs = vec![
            ("name", &rules.name),
            ("price", &rules.price),
            ("link", &rules.link),
            ("image", &rules.image),
        ];
        if let Some(label) = &rules.label {
            specs.push(("label", label));
        }

        for school in schools.iter().take(limit) {
            let Some(store_page) = &school.store_page else {
                tracing::warn!("School {} has no store page; skipping", school.id);
                report.record_skip("no-link");
                continue;
            };
            let url = with_query(store_page, rules.query.as_deref());

            let read = self.read_listing(&url, &rules.listing, &specs, report).await;
            for extraction in read.records {
                let mut fields = match accept(extraction, report, &url) {
                    Some(fields) => fields,
                    None => continue,
                };
                products.push(Product {
                    id: ids.next_id(),
                    school_id: school.id,
                    name: fields.take("name"),
                    price: fields.take("price"),
                    link: fields.take("link"),
                    image: fields.take("image"),
                    label: fields.take("label"),
                });
            }

            if read.aborted {
                report.aborted = true;
                break;
            }
        }

        products
    }

    /// Reads the variant tier from each product's detail page
    async fn variants(
        &mut self,
        rules: &VariantTier,
        products: &[Product],
        report: &mut TierReport,
    ) -> Vec<Variant> {
        let limit = self.settings.max_products.unwrap_or(usize::MAX);
        tracing::info!(
            "Reading variants for {} products",
            products.len().min(limit)
        );

        let mut ids = IdSequence::new();
        let mut variants = Vec::new();
        for product in products.iter().take(limit) {
            self.product_variants(rules, product, &mut ids, &mut variants, report)
                .await;
        }
        variants
    }
}

/// Unwraps an accepted record, tallying skips and padding
fn accept(
    extraction: Extraction<Fields>,
    report: &mut TierReport,
    page: &str,
) -> Option<Fields> {
    match extraction {
        Extraction::Record(fields) => {
            if !fields.padded.is_empty() {
                report.padded += 1;
            }
            Some(fields)
        }
        Extraction::Skipped(reason) => {
            tracing::warn!("Skipping {} record on {}: {}", report.tier, page, reason);
            report.record_skip(&reason.kind);
            None
        }
    }
}

/// Appends `query` to `url` with `?` or `&` as appropriate
pub(crate) fn with_query(url: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", url, separator, query)
        }
        _ => url.to_string(),
    }
}
