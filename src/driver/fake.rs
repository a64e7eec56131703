//! Scripted in-memory driver for crawler tests

use crate::driver::dom::StaticPage;
use crate::driver::{Driver, DriverError, DriverResult, PageNode};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use url::Url;

/// Serves fixed pages and replays scripted page changes
///
/// - Clicking a link navigates to its `href`.
/// - Clicking anything else replaces the body with the next queued
///   `on_click` body for the current URL.
/// - Selecting an option replaces the body with the `on_select` body for the
///   option's text, or fails when the text is in `failing_options`.
/// - `execute_script` returns the queued document heights in turn.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pages: HashMap<String, String>,
    clicks: HashMap<String, VecDeque<String>>,
    selections: HashMap<String, String>,
    failing_options: HashSet<String>,
    heights: VecDeque<u64>,
    page: Option<StaticPage>,
    generation: u64,
    pub visited: Vec<String>,
    pub click_count: usize,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, url: &str, body: &str) {
        self.pages.insert(url.to_string(), body.to_string());
    }

    pub fn on_click(&mut self, url: &str, body: &str) {
        self.clicks
            .entry(url.to_string())
            .or_default()
            .push_back(body.to_string());
    }

    pub fn on_select(&mut self, option_text: &str, body: &str) {
        self.selections
            .insert(option_text.to_string(), body.to_string());
    }

    pub fn fail_option(&mut self, option_text: &str) {
        self.failing_options.insert(option_text.to_string());
    }

    pub fn push_height(&mut self, height: u64) {
        self.heights.push_back(height);
    }

    fn page(&self) -> DriverResult<&StaticPage> {
        self.page
            .as_ref()
            .ok_or_else(|| DriverError::NotFound("no page loaded".to_string()))
    }

    fn page_mut(&mut self) -> DriverResult<&mut StaticPage> {
        self.page
            .as_mut()
            .ok_or_else(|| DriverError::NotFound("no page loaded".to_string()))
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = PageNode;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.visited.push(url.to_string());
        let navigation_error = |reason: &str| DriverError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url).map_err(|e| navigation_error(&e.to_string()))?;
        let body = self
            .pages
            .get(parsed.as_str())
            .or_else(|| self.pages.get(url))
            .cloned()
            .ok_or_else(|| navigation_error("HTTP 404"))?;

        self.generation += 1;
        self.page = Some(StaticPage::new(parsed, body, self.generation));
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.page.as_ref().map(|page| page.url().to_string())
    }

    async fn find_elements(
        &self,
        scope: Option<&PageNode>,
        selector: &str,
    ) -> DriverResult<Vec<PageNode>> {
        self.page()?.select(scope, selector)
    }

    async fn attribute(&self, element: &PageNode, name: &str) -> DriverResult<Option<String>> {
        Ok(element.attribute(name).map(str::to_string))
    }

    async fn text(&self, element: &PageNode) -> DriverResult<String> {
        Ok(element.text().to_string())
    }

    async fn inner_html(&self, element: &PageNode) -> DriverResult<String> {
        Ok(element.inner_html().to_string())
    }

    async fn click(&mut self, element: &PageNode) -> DriverResult<()> {
        self.click_count += 1;

        if let ("a", Some(href)) = (element.tag(), element.attribute("href")) {
            let href = href.to_string();
            return self.navigate(&href).await;
        }

        let url = self.page()?.url().to_string();
        let body = self
            .clicks
            .get_mut(&url)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| DriverError::Interaction(format!("nothing scripted for <{}>", element.tag())))?;
        self.page_mut()?.replace_body(body);
        Ok(())
    }

    async fn send_keys(&mut self, _element: &PageNode, _keys: &str) -> DriverResult<()> {
        self.page()?;
        Ok(())
    }

    async fn select_option(&mut self, _control: &PageNode, option: &PageNode) -> DriverResult<()> {
        let label = option.text().to_string();
        if self.failing_options.contains(&label) {
            return Err(DriverError::Interaction(format!("option '{}' is disabled", label)));
        }
        if let Some(body) = self.selections.get(&label).cloned() {
            self.page_mut()?.replace_body(body);
        }
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> DriverResult<serde_json::Value> {
        self.heights
            .pop_front()
            .map(serde_json::Value::from)
            .ok_or_else(|| DriverError::Interaction("script failed".to_string()))
    }

    async fn snapshot(&self, path: &Path) -> DriverResult<()> {
        let body = self.page()?.body().to_string();
        tokio::fs::write(path, body).await?;
        Ok(())
    }
}
