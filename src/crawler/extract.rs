//! Field extraction
//!
//! Reads adapter field rules from page elements and folds per-field
//! failures into an explicit per-record result according to the configured
//! `RecordPolicy`.

use crate::adapter::{Extract, FieldRule, ListRule};
use crate::config::RecordPolicy;
use crate::driver::{Driver, DriverError};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Failure to read a single field
#[derive(Debug, Error)]
pub enum FieldError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("value '{value}' does not match pattern '{pattern}'")]
    NoMatch { value: String, pattern: String },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl FieldError {
    /// Short, stable name used to tally skip reasons
    pub fn kind(&self) -> &'static str {
        match self {
            FieldError::Driver(e) => e.kind(),
            FieldError::NoMatch { .. } => "no-match",
            FieldError::Pattern(_) => "pattern",
        }
    }
}

/// Why a record was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason {
    /// Field (or step) that failed
    pub field: String,
    /// Reason kind, as tallied in the run report
    pub kind: String,
    pub detail: String,
}

impl SkipReason {
    pub fn new(field: &str, kind: &str, detail: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: kind.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.field, self.kind, self.detail)
    }
}

/// Outcome of extracting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    Record(T),
    Skipped(SkipReason),
}

/// Named field values of an accepted record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    values: Vec<(String, Option<String>)>,
    /// Required fields left empty under `RecordPolicy::NullPad`
    pub padded: Vec<String>,
}

impl Fields {
    /// Removes and returns the value of `name`
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.values
            .iter_mut()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.take())
    }

    fn push(&mut self, name: &str, value: Option<String>) {
        self.values.push((name.to_string(), value));
    }
}

/// A field rule bound to the element it is read from
///
/// `scope` is `None` when the rule's selector is resolved against the whole
/// page.
pub struct FieldSpec<'a, E> {
    pub name: &'a str,
    pub rule: &'a FieldRule,
    pub scope: Option<&'a E>,
}

impl<'a, E> FieldSpec<'a, E> {
    pub fn new(name: &'a str, rule: &'a FieldRule, scope: Option<&'a E>) -> Self {
        Self { name, rule, scope }
    }
}

/// Applies field rules, caching compiled patterns
#[derive(Debug)]
pub struct FieldReader {
    policy: RecordPolicy,
    patterns: HashMap<String, Regex>,
}

impl FieldReader {
    pub fn new(policy: RecordPolicy) -> Self {
        Self {
            policy,
            patterns: HashMap::new(),
        }
    }

    /// Reads every field of one record
    ///
    /// Optional fields are left empty when they fail. A failing required
    /// field skips the record under `RecordPolicy::Skip` and is left empty
    /// under `RecordPolicy::NullPad`.
    pub async fn read_record<D: Driver>(
        &mut self,
        driver: &D,
        specs: &[FieldSpec<'_, D::Element>],
    ) -> Extraction<Fields> {
        let mut fields = Fields::default();

        for spec in specs {
            match self.read(driver, spec.scope, spec.rule).await {
                Ok(value) => fields.push(spec.name, Some(value)),
                Err(e) if spec.rule.optional => {
                    tracing::trace!("Optional field '{}' empty: {}", spec.name, e);
                    fields.push(spec.name, None);
                }
                Err(e) => match self.policy {
                    RecordPolicy::Skip => {
                        return Extraction::Skipped(SkipReason::new(
                            spec.name,
                            e.kind(),
                            e.to_string(),
                        ));
                    }
                    RecordPolicy::NullPad => {
                        tracing::debug!("Padding field '{}': {}", spec.name, e);
                        fields.padded.push(spec.name.to_string());
                        fields.push(spec.name, None);
                    }
                },
            }
        }

        Extraction::Record(fields)
    }

    /// Reads one field
    ///
    /// # Arguments
    ///
    /// * `driver` - The page session
    /// * `scope` - Element the rule applies to; `None` resolves the selector on the page
    /// * `rule` - The field rule
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The extracted value, after the rule's pattern
    /// * `Err(FieldError)` - The element, attribute or pattern match is missing
    pub async fn read<D: Driver>(
        &mut self,
        driver: &D,
        scope: Option<&D::Element>,
        rule: &FieldRule,
    ) -> Result<String, FieldError> {
        let target = match (&rule.selector, scope) {
            (Some(selector), scope) => driver.find_element(scope, selector).await?,
            (None, Some(element)) => element.clone(),
            (None, None) => {
                return Err(DriverError::NotFound("field has no selector or element".to_string()).into())
            }
        };

        let raw = read_value(driver, &target, &rule.extract).await?;

        match &rule.pattern {
            Some(pattern) => self.capture(pattern, &raw),
            None => Ok(raw),
        }
    }

    /// Reads every element matched by a list rule, page-wide
    ///
    /// Elements lacking the requested attribute are left out; a failing
    /// query yields an empty list.
    pub async fn read_list<D: Driver>(&self, driver: &D, rule: &ListRule) -> Vec<String> {
        let elements = match driver.find_elements(None, &rule.selector).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!("List '{}' unreadable: {}", rule.selector, e);
                return Vec::new();
            }
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Ok(value) = read_value(driver, element, &rule.extract).await {
                if !value.is_empty() {
                    values.push(value);
                }
            }
        }
        values
    }

    fn capture(&mut self, pattern: &str, value: &str) -> Result<String, FieldError> {
        if !self.patterns.contains_key(pattern) {
            let compiled = Regex::new(pattern)?;
            self.patterns.insert(pattern.to_string(), compiled);
        }

        let no_match = || FieldError::NoMatch {
            value: value.to_string(),
            pattern: pattern.to_string(),
        };
        let regex = self.patterns.get(pattern).ok_or_else(no_match)?;
        let captures = regex.captures(value).ok_or_else(no_match)?;

        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str().trim().to_string())
            .ok_or_else(no_match)
    }
}

async fn read_value<D: Driver>(
    driver: &D,
    element: &D::Element,
    extract: &Extract,
) -> Result<String, FieldError> {
    let value = match extract {
        Extract::Text => driver.text(element).await?,
        Extract::Html => driver.inner_html(element).await?,
        Extract::Attribute(name) => driver
            .attribute(element, name)
            .await?
            .ok_or_else(|| DriverError::NotFound(format!("attribute '{}'", name)))?,
    };
    Ok(value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;

    const PAGE: &str = r#"
<html><body>
  <div class="card">
    <h3>Alpha Primary (URN-12345)</h3>
    <a href="/alpha">Shop</a>
  </div>
  <ul class="care">
    <li><img alt="Machine wash"></li><li><img alt="Iron"></li><li><img></li>
  </ul>
</body></html>
"#;

    async fn driver() -> FakeDriver {
        let mut driver = FakeDriver::new();
        driver.add_page("https://shop.test/", PAGE);
        driver.navigate("https://shop.test/").await.unwrap();
        driver
    }

    fn rule(selector: Option<&str>, extract: Extract) -> FieldRule {
        FieldRule {
            selector: selector.map(str::to_string),
            extract,
            ..FieldRule::default()
        }
    }

    #[tokio::test]
    async fn test_read_text_attribute_and_pattern() {
        let driver = driver().await;
        let card = driver.find_element(None, ".card").await.unwrap();
        let mut reader = FieldReader::new(RecordPolicy::Skip);

        let name = reader
            .read(&driver, Some(&card), &rule(Some("h3"), Extract::Text))
            .await
            .unwrap();
        assert_eq!(name, "Alpha Primary (URN-12345)");

        let link = reader
            .read(
                &driver,
                Some(&card),
                &rule(Some("a"), Extract::Attribute("href".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(link, "https://shop.test/alpha");

        let mut urn = rule(Some("h3"), Extract::Text);
        urn.pattern = Some(r"URN-([^)\s]+)".to_string());
        assert_eq!(reader.read(&driver, Some(&card), &urn).await.unwrap(), "12345");

        urn.pattern = Some(r"DfE-(\d+)".to_string());
        let err = reader.read(&driver, Some(&card), &urn).await.unwrap_err();
        assert_eq!(err.kind(), "no-match");
    }

    #[tokio::test]
    async fn test_read_missing_element_and_attribute() {
        let driver = driver().await;
        let card = driver.find_element(None, ".card").await.unwrap();
        let mut reader = FieldReader::new(RecordPolicy::Skip);

        let err = reader
            .read(&driver, Some(&card), &rule(Some(".price"), Extract::Text))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not-found");

        let err = reader
            .read(
                &driver,
                Some(&card),
                &rule(Some("a"), Extract::Attribute("data-sku".to_string())),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not-found");
    }

    #[tokio::test]
    async fn test_read_record_policies() {
        let driver = driver().await;
        let card = driver.find_element(None, ".card").await.unwrap();
        let name = rule(Some("h3"), Extract::Text);
        let price = rule(Some(".price"), Extract::Text);
        let mut label = rule(Some(".label"), Extract::Text);
        label.optional = true;

        let specs = [
            FieldSpec::new("name", &name, Some(&card)),
            FieldSpec::new("price", &price, Some(&card)),
            FieldSpec::new("label", &label, Some(&card)),
        ];

        let mut skip = FieldReader::new(RecordPolicy::Skip);
        match skip.read_record(&driver, &specs).await {
            Extraction::Skipped(reason) => {
                assert_eq!(reason.field, "price");
                assert_eq!(reason.kind, "not-found");
            }
            other => panic!("expected skip, got {:?}", other),
        }

        let mut pad = FieldReader::new(RecordPolicy::NullPad);
        match pad.read_record(&driver, &specs).await {
            Extraction::Record(mut fields) => {
                assert_eq!(fields.padded, vec!["price".to_string()]);
                assert_eq!(fields.take("name").as_deref(), Some("Alpha Primary (URN-12345)"));
                assert_eq!(fields.take("price"), None);
                assert_eq!(fields.take("label"), None);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_field_does_not_skip() {
        let driver = driver().await;
        let card = driver.find_element(None, ".card").await.unwrap();
        let name = rule(Some("h3"), Extract::Text);
        let mut label = rule(Some(".label"), Extract::Text);
        label.optional = true;

        let specs = [
            FieldSpec::new("name", &name, Some(&card)),
            FieldSpec::new("label", &label, Some(&card)),
        ];
        let mut reader = FieldReader::new(RecordPolicy::Skip);
        match reader.read_record(&driver, &specs).await {
            Extraction::Record(fields) => assert!(fields.padded.is_empty()),
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_list() {
        let driver = driver().await;
        let reader = FieldReader::new(RecordPolicy::Skip);
        let icons = ListRule {
            selector: ".care img".to_string(),
            extract: Extract::Attribute("alt".to_string()),
        };

        assert_eq!(
            reader.read_list(&driver, &icons).await,
            vec!["Machine wash".to_string(), "Iron".to_string()]
        );

        let missing = ListRule {
            selector: ".colours li".to_string(),
            extract: Extract::Text,
        };
        assert!(reader.read_list(&driver, &missing).await.is_empty());
    }
}
