//! Listing pages: sources, preparation and expansion
//!
//! A listing page is read in four steps: navigate, run best-effort
//! preparation actions, check the container, then grow the listing with the
//! adapter's expansion rule and extract every item.

use crate::adapter::{Action, Expansion, FieldRule, Listing, ListingSource};
use crate::crawler::coordinator::Walker;
use crate::crawler::extract::{Extraction, FieldSpec, Fields};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::output::TierReport;
use std::collections::HashSet;
use tokio::time::Instant;

/// Scrolls to the bottom and returns the new document height
const SCROLL_SCRIPT: &str =
    "window.scrollTo(0, document.body.scrollHeight); return document.body.scrollHeight;";

/// Returns the current document height
const HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";

/// Records read from one listing source URL
#[derive(Debug, Default)]
pub(crate) struct ListingRead {
    pub records: Vec<Extraction<Fields>>,
    /// The listing container was missing; the tier must stop
    pub aborted: bool,
}

impl<D: Driver> Walker<'_, D> {
    /// Resolves a listing source to the pages to read
    ///
    /// `Entries` sources have no pages.
    pub(super) async fn listing_pages(
        &mut self,
        source: &ListingSource,
        report: &mut TierReport,
    ) -> Vec<String> {
        match source {
            ListingSource::Fixed(url) => vec![url.clone()],
            ListingSource::Urls(urls) => urls.clone(),
            ListingSource::Letters(template) => ('a'..='z')
                .map(|letter| template.replace("{letter}", &letter.to_string()))
                .collect(),
            ListingSource::Discovered { seed, link } => {
                self.discover(seed, link, report).await
            }
            ListingSource::Entries(_) => Vec::new(),
        }
    }

    /// Harvests listing links from a seed page, first occurrence order
    async fn discover(&mut self, seed: &str, link: &str, report: &mut TierReport) -> Vec<String> {
        tracing::debug!("Discovering listing pages from {}", seed);
        if let Err(e) = self.driver.navigate(seed).await {
            tracing::warn!("Seed page {} unavailable: {}", seed, e);
            report.record_skip(e.kind());
            return Vec::new();
        }

        let elements = match self.driver.find_elements(None, link).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::warn!("No listing links on {}: {}", seed, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut pages = Vec::new();
        for element in &elements {
            if let Ok(Some(href)) = self.driver.attribute(element, "href").await {
                if seen.insert(href.clone()) {
                    pages.push(href);
                }
            }
        }

        tracing::info!("Discovered {} listing pages", pages.len());
        pages
    }

    /// Reads every item of the listing at `url`
    ///
    /// A navigation failure skips the page. A missing container aborts
    /// the listing, keeping the records read from earlier pages.
    pub(super) async fn read_listing(
        &mut self,
        url: &str,
        listing: &Listing,
        fields: &[(&str, &FieldRule)],
        report: &mut TierReport,
    ) -> ListingRead {
        let mut read = ListingRead::default();

        tracing::debug!("Reading listing {}", url);
        if let Err(e) = self.driver.navigate(url).await {
            tracing::warn!("Skipping listing {}: {}", url, e);
            report.record_skip(e.kind());
            return read;
        }

        self.prepare(&listing.prepare).await;

        let mut visited = HashSet::from([url.to_string()]);
        let mut page_index = 0usize;
        let mut hops = 0u32;

        loop {
            let container = match self.resolve_container(listing).await {
                Ok(container) => container,
                Err(e) => {
                    self.log_missing_container(listing, url, &e);
                    read.aborted = true;
                    return read;
                }
            };

            let attempts = match &listing.expansion {
                Expansion::LoadMore(control) => self.load_more(control, listing).await,
                Expansion::Scroll => self.scroll().await,
                Expansion::None | Expansion::NextPage(_) => 0,
            };
            report.expansions += attempts;

            // An expansion may have replaced the page the container handle points into
            let container = if attempts > 0 {
                match self.resolve_container(listing).await {
                    Ok(container) => container,
                    Err(e) => {
                        self.log_missing_container(listing, url, &e);
                        read.aborted = true;
                        return read;
                    }
                }
            } else {
                container
            };

            let items = match self
                .driver
                .find_elements(container.as_ref(), &listing.item)
                .await
            {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Listing items unreadable on {}: {}", url, e);
                    report.record_skip(e.kind());
                    Vec::new()
                }
            };

            // A followed page without items is the no-growth observation
            if page_index > 0 && items.is_empty() {
                break;
            }

            tracing::debug!("Found {} items on listing page {}", items.len(), page_index + 1);
            // Leading menu entries only appear on the first page
            let skip = if page_index == 0 { listing.skip } else { 0 };
            for item in items.iter().skip(skip) {
                let specs: Vec<FieldSpec<'_, D::Element>> = fields
                    .iter()
                    .map(|&(name, rule)| FieldSpec::new(name, rule, Some(item)))
                    .collect();
                let extraction = self.fields.read_record(&*self.driver, &specs).await;
                read.records.push(extraction);
            }

            let Expansion::NextPage(next) = &listing.expansion else {
                break;
            };
            if hops >= self.settings.max_expansions {
                break;
            }
            let Some(next_url) = self.next_page_url(next).await else {
                break;
            };
            if !visited.insert(next_url.clone()) {
                break;
            }

            hops += 1;
            report.expansions += 1;
            if let Err(e) = self.driver.navigate(&next_url).await {
                tracing::warn!("Next page {} unavailable: {}", next_url, e);
                report.record_skip(e.kind());
                break;
            }
            page_index += 1;
        }

        read
    }

    /// Runs preparation actions; failures are logged and ignored
    async fn prepare(&mut self, actions: &[Action]) {
        for action in actions {
            let result = match action {
                Action::Click(selector) => match self.driver.find_element(None, selector).await {
                    Ok(element) => self.driver.click(&element).await,
                    Err(e) => Err(e),
                },
                Action::SendKeys { selector, keys } => {
                    match self.driver.find_element(None, selector).await {
                        Ok(element) => self.driver.send_keys(&element, keys).await,
                        Err(e) => Err(e),
                    }
                }
                Action::ScrollToBottom => self.driver.execute_script(SCROLL_SCRIPT).await.map(|_| ()),
            };

            if let Err(e) = result {
                tracing::debug!("Preparation step {:?} failed: {}", action, e);
            }
        }
    }

    /// Clicks the load-more control until the item count stops growing
    ///
    /// # Returns
    ///
    /// The number of clicks made, including the one that added nothing
    async fn load_more(&mut self, control: &str, listing: &Listing) -> u32 {
        let mut count = self.count_items(listing).await;
        let mut attempts = 0;

        while attempts < self.settings.max_expansions {
            let button = match self.driver.find_element(None, control).await {
                Ok(button) => button,
                Err(_) => break,
            };
            if let Err(e) = self.driver.click(&button).await {
                tracing::debug!("Load-more click failed: {}", e);
                break;
            }
            attempts += 1;

            let grown = self.wait_for_growth(count, listing).await;
            if grown <= count {
                break;
            }
            count = grown;
        }

        tracing::debug!("Load-more: {} attempts, {} items", attempts, count);
        attempts
    }

    /// Scrolls to the bottom until the document height stops growing
    ///
    /// # Returns
    ///
    /// The number of scrolls made, including the one that added nothing
    async fn scroll(&mut self) -> u32 {
        let Some(mut height) = self.script_height(HEIGHT_SCRIPT).await else {
            return 0;
        };
        let mut attempts = 0;

        while attempts < self.settings.max_expansions {
            let Some(mut after) = self.script_height(SCROLL_SCRIPT).await else {
                break;
            };
            attempts += 1;

            let started = Instant::now();
            while after <= height
                && self.driver.is_dynamic()
                && started.elapsed() < self.settings.settle_timeout()
            {
                tokio::time::sleep(self.settings.poll_interval()).await;
                match self.script_height(HEIGHT_SCRIPT).await {
                    Some(current) => after = current,
                    None => break,
                }
            }

            if after <= height {
                break;
            }
            height = after;
        }

        tracing::debug!("Scroll: {} attempts, height {}", attempts, height);
        attempts
    }

    async fn script_height(&mut self, script: &str) -> Option<u64> {
        match self.driver.execute_script(script).await {
            Ok(value) => value.as_u64().or_else(|| value.as_f64().map(|h| h as u64)),
            Err(e) => {
                tracing::debug!("Height script unavailable: {}", e);
                None
            }
        }
    }

    /// Waits for the listing container; `None` when the listing names none
    async fn resolve_container(&self, listing: &Listing) -> DriverResult<Option<D::Element>> {
        match &listing.container {
            Some(selector) => self
                .driver
                .wait_for(
                    selector,
                    self.settings.wait_timeout(),
                    self.settings.poll_interval(),
                )
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    fn log_missing_container(&self, listing: &Listing, url: &str, error: &DriverError) {
        tracing::error!(
            "Listing container '{}' missing on {}: {}",
            listing.container.as_deref().unwrap_or_default(),
            self.driver.current_url().unwrap_or_else(|| url.to_string()),
            error
        );
    }

    /// Counts items on the current page, locating the container afresh
    async fn count_items(&self, listing: &Listing) -> usize {
        let container = match &listing.container {
            Some(selector) => match self.driver.find_elements(None, selector).await {
                Ok(found) => match found.into_iter().next() {
                    Some(container) => Some(container),
                    None => return 0,
                },
                Err(_) => return 0,
            },
            None => None,
        };

        self.driver
            .find_elements(container.as_ref(), &listing.item)
            .await
            .map(|items| items.len())
            .unwrap_or(0)
    }

    /// Polls the item count until it exceeds `previous` or the settle timeout passes
    async fn wait_for_growth(&self, previous: usize, listing: &Listing) -> usize {
        let started = Instant::now();
        loop {
            let count = self.count_items(listing).await;
            if count > previous
                || !self.driver.is_dynamic()
                || started.elapsed() >= self.settings.settle_timeout()
            {
                return count;
            }
            tokio::time::sleep(self.settings.poll_interval()).await;
        }
    }

    async fn next_page_url(&self, selector: &str) -> Option<String> {
        let link = self.driver.find_element(None, selector).await.ok()?;
        self.driver.attribute(&link, "href").await.ok().flatten()
    }
}
