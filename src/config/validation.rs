use crate::adapter::{FieldRule, ListRule, Listing, ListingSource, SiteAdapter};
use crate::config::types::{Config, CrawlSettings, DriverConfig, OutputConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_driver_config(&config.driver)?;
    validate_output_config(&config.output)?;
    for site in &config.site {
        validate_site(site)?;
    }
    Ok(())
}

/// Validates crawl settings
fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.max_expansions < 1 || settings.max_expansions > 1000 {
        return Err(ConfigError::Validation(format!(
            "max_expansions must be between 1 and 1000, got {}",
            settings.max_expansions
        )));
    }

    if settings.poll_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be >= 10ms, got {}ms",
            settings.poll_interval_ms
        )));
    }

    if settings.wait_timeout_ms < settings.poll_interval_ms {
        return Err(ConfigError::Validation(format!(
            "wait_timeout_ms ({}ms) must not be shorter than poll_interval_ms ({}ms)",
            settings.wait_timeout_ms, settings.poll_interval_ms
        )));
    }

    if settings.max_schools == Some(0) || settings.max_products == Some(0) {
        return Err(ConfigError::Validation(
            "max_schools and max_products must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates driver configuration
fn validate_driver_config(config: &DriverConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be >= 1s".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.snapshot_directory.as_deref() == Some("") {
        return Err(ConfigError::Validation(
            "snapshot_directory cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates a single site adapter
///
/// Checks the supplier name, every URL, every CSS selector and every field
/// pattern the adapter names.
pub fn validate_site(site: &SiteAdapter) -> Result<(), ConfigError> {
    validate_site_name(&site.name)?;

    let schools = &site.schools;
    validate_source(site, &schools.source)?;

    match (&schools.source, &schools.listing) {
        (ListingSource::Entries(_), _) => {}
        (_, Some(listing)) => {
            validate_listing(site, listing)?;
            validate_field(site, &schools.name)?;
            validate_field(site, &schools.store_page)?;
            if let Some(urn) = &schools.urn {
                validate_field(site, urn)?;
            }
        }
        (_, None) => {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must describe a school listing",
                site.name
            )));
        }
    }

    if let Some(products) = &site.products {
        validate_listing(site, &products.listing)?;
        for rule in [&products.name, &products.price, &products.link, &products.image] {
            validate_field(site, rule)?;
        }
        if let Some(label) = &products.label {
            validate_field(site, label)?;
        }
        if let Some(query) = &products.query {
            if query.is_empty() || query.starts_with('?') || query.starts_with('&') {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' product query must be a bare 'key=value' string, got '{}'",
                    site.name, query
                )));
            }
        }
    }

    if let Some(variants) = &site.variants {
        if site.products.is_none() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' describes variants without products",
                site.name
            )));
        }
        validate_selector(site, &variants.control)?;
        validate_selector(site, &variants.option)?;
        validate_field(site, &variants.size)?;
        validate_field(site, &variants.price)?;
        if let Some(description) = &variants.description {
            validate_field(site, description)?;
        }
        for list in [&variants.icons, &variants.colors].into_iter().flatten() {
            validate_list(site, list)?;
        }
    }

    Ok(())
}

/// Supplier names are used in file names: lowercase alphanumerics, `-` and `_`
fn validate_site_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "site name must contain only lowercase letters, digits, '-' and '_', got '{}'",
            name
        )));
    }

    Ok(())
}

fn validate_source(site: &SiteAdapter, source: &ListingSource) -> Result<(), ConfigError> {
    match source {
        ListingSource::Fixed(url) => validate_url(url),
        ListingSource::Urls(urls) => {
            if urls.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' lists no category URLs",
                    site.name
                )));
            }
            urls.iter().try_for_each(|url| validate_url(url))
        }
        ListingSource::Letters(template) => {
            if !template.contains("{letter}") {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' letter template must contain '{{letter}}', got '{}'",
                    site.name, template
                )));
            }
            validate_url(&template.replace("{letter}", "a"))
        }
        ListingSource::Discovered { seed, link } => {
            validate_url(seed)?;
            validate_selector(site, link)
        }
        ListingSource::Entries(entries) => {
            if entries.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' declares no entries",
                    site.name
                )));
            }
            entries.iter().try_for_each(|entry| validate_url(&entry.url))
        }
    }
}

fn validate_listing(site: &SiteAdapter, listing: &Listing) -> Result<(), ConfigError> {
    listing
        .selectors()
        .try_for_each(|selector| validate_selector(site, selector))
}

fn validate_field(site: &SiteAdapter, rule: &FieldRule) -> Result<(), ConfigError> {
    if let Some(selector) = &rule.selector {
        validate_selector(site, selector)?;
    }

    if let Some(pattern) = &rule.pattern {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            site: site.name.clone(),
            message: e.to_string(),
        })?;
    }

    Ok(())
}

fn validate_list(site: &SiteAdapter, rule: &ListRule) -> Result<(), ConfigError> {
    validate_selector(site, &rule.selector)
}

fn validate_selector(site: &SiteAdapter, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            site: site.name.clone(),
            selector: selector.to_string(),
        })
}

fn validate_url(url: &str) -> Result<(), ConfigError> {
    let parsed =
        Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            url
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SiteFile;

    fn parse_site(content: &str) -> SiteAdapter {
        let mut file: SiteFile = toml::from_str(content).unwrap();
        file.site.remove(0)
    }

    const VALID_SITE: &str = r#"
[[site]]
name = "shop"

[site.schools]
source = { fixed = "https://shop.example.com/schools" }
name = { selector = "h3" }
store-page = { selector = "a", extract = { attribute = "href" } }

[site.schools.listing]
item = ".school"
"#;

    #[test]
    fn test_validate_site_name() {
        assert!(validate_site_name("monkhouse").is_ok());
        assert!(validate_site_name("top-form_2").is_ok());

        assert!(validate_site_name("").is_err());
        assert!(validate_site_name("Monkhouse").is_err());
        assert!(validate_site_name("shop/../etc").is_err());
        assert!(validate_site_name("two words").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/schools").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("ftp://example.com/").is_err());
    }

    #[test]
    fn test_valid_site() {
        let site = parse_site(VALID_SITE);
        assert!(validate_site(&site).is_ok());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let site = parse_site(&VALID_SITE.replace(r#"item = ".school""#, r#"item = "..school""#));
        let err = validate_site(&site).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { ref selector, .. } if selector == "..school"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let site = parse_site(&VALID_SITE.replace(
            r#"name = { selector = "h3" }"#,
            r#"name = { selector = "h3", pattern = "URN-(" }"#,
        ));
        assert!(matches!(
            validate_site(&site).unwrap_err(),
            ConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_letter_template_requires_placeholder() {
        let site = parse_site(&VALID_SITE.replace(
            r#"source = { fixed = "https://shop.example.com/schools" }"#,
            r#"source = { letters = "https://shop.example.com/schools/a" }"#,
        ));
        assert!(matches!(
            validate_site(&site).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_listing_required_unless_entries() {
        let site = parse_site(
            r#"
[[site]]
name = "shop"

[site.schools]
source = { fixed = "https://shop.example.com/schools" }
"#,
        );
        assert!(validate_site(&site).is_err());

        let site = parse_site(
            r#"
[[site]]
name = "shop"

[site.schools]
source = { entries = [{ name = "Boys", url = "https://shop.example.com/boys" }] }
"#,
        );
        assert!(validate_site(&site).is_ok());
    }

    #[test]
    fn test_variants_require_products() {
        let content = format!(
            "{}\n{}",
            VALID_SITE,
            r#"
[site.variants]
control = "select.size"
option = "option"
size = {}
price = { selector = ".price" }
"#
        );
        let site = parse_site(&content);
        assert!(validate_site(&site).is_err());
    }

    #[test]
    fn test_validate_crawl_settings() {
        let mut settings = CrawlSettings::default();
        assert!(validate_crawl_settings(&settings).is_ok());

        settings.max_expansions = 0;
        assert!(validate_crawl_settings(&settings).is_err());

        settings = CrawlSettings::default();
        settings.wait_timeout_ms = 50;
        settings.poll_interval_ms = 100;
        assert!(validate_crawl_settings(&settings).is_err());

        settings = CrawlSettings::default();
        settings.max_products = Some(0);
        assert!(validate_crawl_settings(&settings).is_err());
    }
}
