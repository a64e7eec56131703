//! Static-HTML driver
//!
//! Fetches pages with reqwest and answers element queries from the fetched
//! markup. Scripts never run, so interactions other than following links
//! are reported as unsupported or ignored.

use crate::config::DriverConfig;
use crate::driver::dom::StaticPage;
use crate::driver::{Driver, DriverError, DriverResult, PageNode};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with the configured user agent and timeouts
///
/// # Arguments
///
/// * `config` - The driver configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use uniform_catalog::config::DriverConfig;
/// use uniform_catalog::driver::build_http_client;
///
/// let client = build_http_client(&DriverConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &DriverConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Driver that reads server-rendered markup
pub struct HttpDriver {
    client: Client,
    page: Option<StaticPage>,
    generation: u64,
}

impl HttpDriver {
    /// Creates a driver with a client built from `config`
    pub fn new(config: &DriverConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a driver around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            page: None,
            generation: 0,
        }
    }

    fn page(&self) -> DriverResult<&StaticPage> {
        self.page
            .as_ref()
            .ok_or_else(|| DriverError::NotFound("no page loaded".to_string()))
    }

    async fn fetch(&self, url: &str) -> Result<(Url, String), String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| e.to_string())?;
        Ok((final_url, body))
    }
}

#[async_trait]
impl Driver for HttpDriver {
    type Element = PageNode;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        tracing::debug!("GET {}", url);

        let (final_url, body) = self
            .fetch(url)
            .await
            .map_err(|reason| DriverError::Navigation {
                url: url.to_string(),
                reason,
            })?;

        self.generation += 1;
        self.page = Some(StaticPage::new(final_url, body, self.generation));
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

    /// Following a link is the only click a static page can honour
    async fn click(&mut self, element: &PageNode) -> DriverResult<()> {
        match (element.tag(), element.attribute("href")) {
            ("a", Some(href)) => {
                let href = href.to_string();
                self.navigate(&href).await
            }
            (tag, _) => Err(DriverError::Interaction(format!(
                "cannot click <{}> on a static page",
                tag
            ))),
        }
    }

    async fn send_keys(&mut self, _element: &PageNode, _keys: &str) -> DriverResult<()> {
        Err(DriverError::Unsupported("send_keys".to_string()))
    }

    /// The page does not change; only the option is checked
    async fn select_option(&mut self, _control: &PageNode, option: &PageNode) -> DriverResult<()> {
        self.page()?;
        if option.tag() != "option" {
            return Err(DriverError::Interaction(format!(
                "<{}> is not a select option",
                option.tag()
            )));
        }
        Ok(())
    }

    async fn execute_script(&mut self, _script: &str) -> DriverResult<serde_json::Value> {
        Err(DriverError::Unsupported("execute_script".to_string()))
    }

    async fn snapshot(&self, path: &Path) -> DriverResult<()> {
        let body = self.page()?.body().to_string();
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    fn is_dynamic(&self) -> bool {
        false
    }
}
