//! Page-session interface used by the crawler
//!
//! This module contains:
//! - The `Driver` trait, the narrow set of page operations the crawler needs
//! - The `DriverError` taxonomy
//! - `HttpDriver`, a static-HTML implementation built on reqwest and scraper
//!
//! Browser-automation engines plug in by implementing `Driver`.

mod dom;
#[cfg(test)]
pub(crate) mod fake;
mod http;

pub use dom::{PageNode, StaticPage};
pub use http::{build_http_client, HttpDriver};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors raised by a page session
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Unsupported by this driver: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Short, stable name used to tally skip reasons
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::NotFound(_) => "not-found",
            DriverError::Timeout { .. } => "timeout",
            DriverError::Interaction(_) => "interaction",
            DriverError::Navigation { .. } => "navigation",
            DriverError::Unsupported(_) => "unsupported",
            DriverError::Io(_) => "io",
        }
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A live page session
///
/// Element handles are only meaningful for the page they were found on;
/// using one after navigating away yields `DriverError::NotFound`.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Handle to an element of the current page
    type Element: Clone + Debug + Send + Sync;

    /// Loads `url`, replacing the current page
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// URL of the current page, after redirects
    fn current_url(&self) -> Option<String>;

    /// All elements matching `selector`, within `scope` when given
    ///
    /// An empty vector is returned when nothing matches.
    async fn find_elements(
        &self,
        scope: Option<&Self::Element>,
        selector: &str,
    ) -> DriverResult<Vec<Self::Element>>;

    /// First element matching `selector`, within `scope` when given
    async fn find_element(
        &self,
        scope: Option<&Self::Element>,
        selector: &str,
    ) -> DriverResult<Self::Element> {
        self.find_elements(scope, selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(selector.to_string()))
    }

    /// Attribute value, `None` if the element does not carry it
    async fn attribute(&self, element: &Self::Element, name: &str) -> DriverResult<Option<String>>;

    /// Rendered text with whitespace collapsed
    async fn text(&self, element: &Self::Element) -> DriverResult<String>;

    async fn inner_html(&self, element: &Self::Element) -> DriverResult<String>;

    async fn click(&mut self, element: &Self::Element) -> DriverResult<()>;

    async fn send_keys(&mut self, element: &Self::Element, keys: &str) -> DriverResult<()>;

    /// Chooses `option` in a `<select>` control
    async fn select_option(
        &mut self,
        control: &Self::Element,
        option: &Self::Element,
    ) -> DriverResult<()>;

    /// Runs a script in the page and returns its result
    async fn execute_script(&mut self, script: &str) -> DriverResult<serde_json::Value>;

    /// Writes the current page's markup to `path`
    async fn snapshot(&self, path: &Path) -> DriverResult<()>;

    /// Whether the page can change without a navigation
    ///
    /// Static drivers return `false` so callers skip waits that can never
    /// be satisfied.
    fn is_dynamic(&self) -> bool {
        true
    }

    /// Polls until `selector` matches, bounded by `timeout`
    ///
    /// # Returns
    ///
    /// * `Ok(Element)` - The first matching element
    /// * `Err(DriverError::Timeout)` - Nothing matched within `timeout`
    async fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> DriverResult<Self::Element> {
        let started = Instant::now();
        loop {
            if let Some(element) = self.find_elements(None, selector).await?.into_iter().next() {
                return Ok(element);
            }
            if !self.is_dynamic() || started.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    what: selector.to_string(),
                    waited: started.elapsed(),
                });
            }
            tokio::time::sleep(poll).await;
        }
    }
}
