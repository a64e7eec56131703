//! Static DOM for drivers that work on fetched markup
//!
//! `scraper::Html` cannot be held across an `.await` in a `Send` future, so
//! the page keeps its markup as a string and parses it per query. Element
//! handles are locator paths (selector and index per step) resolved from the
//! document root, together with a snapshot of the element's text, markup and
//! attributes taken when it was found.

use crate::driver::{DriverError, DriverResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One step of a locator path
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    selector: String,
    index: usize,
}

/// Handle to an element of a `StaticPage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    generation: u64,
    path: Vec<Step>,
    tag: String,
    text: String,
    inner_html: String,
    attributes: Vec<(String, String)>,
}

impl PageNode {
    /// Lowercase tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text content with whitespace collapsed
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Attribute value; `href` and `src` are already absolute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A loaded page: its final URL and markup
#[derive(Debug, Clone)]
pub struct StaticPage {
    url: Url,
    body: String,
    generation: u64,
}

impl StaticPage {
    /// Creates a page; `generation` distinguishes successive page loads
    pub fn new(url: Url, body: String, generation: u64) -> Self {
        Self {
            url,
            body,
            generation,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replaces the markup in place, keeping existing handles usable
    pub fn replace_body(&mut self, body: String) {
        self.body = body;
    }

    /// Selects elements matching `selector`, within `scope` when given
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<PageNode>)` - Matching elements in document order, possibly empty
    /// * `Err(DriverError::NotFound)` - `scope` belongs to another page or no longer resolves
    /// * `Err(DriverError::Interaction)` - `selector` is not valid CSS
    pub fn select(&self, scope: Option<&PageNode>, selector: &str) -> DriverResult<Vec<PageNode>> {
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&self.body);

        let nodes: Vec<PageNode> = match scope {
            Some(scope) => {
                let element = self.resolve(&document, scope)?;
                element
                    .select(&parsed)
                    .enumerate()
                    .map(|(index, found)| self.snapshot(&scope.path, selector, index, found))
                    .collect()
            }
            None => document
                .select(&parsed)
                .enumerate()
                .map(|(index, found)| self.snapshot(&[], selector, index, found))
                .collect(),
        };

        Ok(nodes)
    }

    /// Resolves a possibly relative reference against the page URL
    pub fn resolve_url(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if reference.is_empty()
            || reference.starts_with("javascript:")
            || reference.starts_with("data:")
        {
            return None;
        }
        self.url.join(reference).ok().map(|url| url.to_string())
    }

    fn resolve<'a>(&self, document: &'a Html, node: &PageNode) -> DriverResult<ElementRef<'a>> {
        if node.generation != self.generation {
            return Err(DriverError::NotFound(format!(
                "stale element <{}> from a previous page",
                node.tag
            )));
        }

        let mut steps = node.path.iter();
        let first = steps
            .next()
            .ok_or_else(|| DriverError::NotFound("empty element path".to_string()))?;
        let mut current = document
            .select(&parse_selector(&first.selector)?)
            .nth(first.index)
            .ok_or_else(|| DriverError::NotFound(first.selector.clone()))?;

        for step in steps {
            current = current
                .select(&parse_selector(&step.selector)?)
                .nth(step.index)
                .ok_or_else(|| DriverError::NotFound(step.selector.clone()))?;
        }

        Ok(current)
    }

    fn snapshot(&self, parent: &[Step], selector: &str, index: usize, element: ElementRef) -> PageNode {
        let mut path = parent.to_vec();
        path.push(Step {
            selector: selector.to_string(),
            index,
        });

        let attributes = element
            .value()
            .attrs()
            .map(|(name, value)| {
                let value = match name {
                    "href" | "src" => self.resolve_url(value).unwrap_or_else(|| value.to_string()),
                    _ => value.to_string(),
                };
                (name.to_string(), value)
            })
            .collect();

        PageNode {
            generation: self.generation,
            path,
            tag: element.value().name().to_ascii_lowercase(),
            text: collapse_whitespace(&element.text().collect::<String>()),
            inner_html: element.inner_html().trim().to_string(),
            attributes,
        }
    }
}

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|_| DriverError::Interaction(format!("invalid selector '{}'", selector)))
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
