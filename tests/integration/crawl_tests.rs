//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small uniform shop and run the full
//! crawl cycle end-to-end with the static HTTP driver, writing CSV exports
//! into temporary directories.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use uniform_catalog::adapter::{SiteAdapter, SiteFile};
use uniform_catalog::catalog::Tier;
use uniform_catalog::config::{load_config, CrawlSettings, DriverConfig};
use uniform_catalog::output::{generate_markdown_summary, summary_path};
use uniform_catalog::{CatalogCrawler, CsvSink, Depth, HarvestError, HttpDriver, SiteRegistry};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Site adapter for the mock shop served at `base_url`
fn create_test_site(base_url: &str) -> SiteAdapter {
    let content = format!(
        r#"
[[site]]
name = "mockshop"
title = "Mock Shop"

[site.schools]
source = {{ fixed = "{base}/schools" }}
name = {{ selector = "a" }}
store-page = {{ selector = "a", extract = {{ attribute = "href" }} }}
urn = {{ selector = "a", pattern = "URN-(\\d+)", optional = true }}

[site.schools.listing]
container = "ul.schools"
item = "li"
skip = 1

[site.products]
query = "limit=100"
name = {{ selector = ".name" }}
price = {{ selector = ".price" }}
link = {{ selector = "a", extract = {{ attribute = "href" }} }}
image = {{ selector = "img", extract = {{ attribute = "src" }} }}

[site.products.listing]
container = ".products"
item = ".product"
expansion = {{ next-page = "a.next" }}

[site.variants]
control = "select#size"
option = "option"
size = {{}}
price = {{ selector = ".price" }}
description = {{ selector = ".description", optional = true }}
icons = {{ selector = ".care img", extract = {{ attribute = "alt" }} }}
"#,
        base = base_url
    );

    let file: SiteFile = toml::from_str(&content).expect("Failed to parse test site");
    file.site.into_iter().next().expect("Test site missing")
}

fn test_settings() -> CrawlSettings {
    CrawlSettings {
        wait_timeout_ms: 50,
        poll_interval_ms: 10,
        settle_timeout_ms: 50,
        ..CrawlSettings::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Mounts a shop with two schools; the second school's products span two pages
async fn mount_shop(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/schools"))
        .respond_with(html(
            r#"<ul class="schools">
                 <li>Choose your school</li>
                 <li><a href="/school/alpha">Alpha Primary (URN-1001)</a></li>
                 <li><a href="/school/beta">Beta Academy</a></li>
               </ul>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/school/alpha"))
        .and(query_param("limit", "100"))
        .respond_with(html(
            r#"<div class="products">
                 <div class="product"><a href="/product/blazer"><img src="/img/blazer.jpg"><span class="name">Blazer</span></a><span class="price">£35.00</span></div>
                 <div class="product"><a href="/product/tie"><img src="/img/tie.jpg"><span class="name">Tie</span></a></div>
               </div>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/school/beta"))
        .and(query_param("limit", "100"))
        .respond_with(html(
            r#"<div class="products">
                 <div class="product"><a href="/product/jumper"><img src="/img/jumper.jpg"><span class="name">Jumper</span></a><span class="price">£18.00</span></div>
               </div>
               <a class="next" href="/school/beta/page2">Next</a>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/school/beta/page2"))
        .respond_with(html(
            r#"<div class="products">
                 <div class="product"><a href="/product/polo"><img src="/img/polo.jpg"><span class="name">Polo</span></a><span class="price">£8.50</span></div>
               </div>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/blazer"))
        .respond_with(html(
            r#"<h1>Blazer</h1>
               <select id="size"><option>30"</option><option>32"</option><option>34"</option></select>
               <span class="price">£35.00</span>
               <ul class="care"><li><img alt="Dry clean"></li></ul>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/product/jumper"))
        .respond_with(html(
            r#"<select id="size"><option>Age 5</option><option>Age 7</option></select>
               <span class="price">£18.00</span><p class="description">Wool blend</p>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    // The polo page has no size selector
    Mock::given(method("GET"))
        .and(path("/product/polo"))
        .respond_with(html("<p>Out of stock</p>".to_string()))
        .mount(server)
        .await;
}

fn read_csv(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open export");
    reader
        .records()
        .map(|record| {
            record
                .expect("Malformed CSV row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_writes_every_tier() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let output_dir = TempDir::new().expect("Failed to create temp dir");
    let snapshot_dir = output_dir.path().join("error");

    let crawler = CatalogCrawler::new(create_test_site(&base_url), test_settings())
        .with_snapshot_dir(Some(snapshot_dir.clone()))
        .with_config_hash("test-hash");
    let mut driver = HttpDriver::new(&DriverConfig::default()).expect("Failed to build driver");
    let mut sink = CsvSink::new(output_dir.path());

    let output = crawler
        .crawl(&mut driver, &mut sink, Depth::Variants)
        .await
        .expect("Crawl failed");

    // Schools: the heading item is skipped
    let schools = read_csv(&sink.path_for("mockshop", Tier::Schools));
    assert_eq!(schools.len(), 2);
    assert_eq!(schools[0][0], "0");
    assert_eq!(schools[0][1], "Alpha Primary (URN-1001)");
    assert_eq!(schools[0][2], format!("{}/school/alpha", base_url));
    assert_eq!(schools[0][3], "1001");
    assert_eq!(schools[1][3], "");

    // Products: the tie has no price and is skipped; beta spans two pages
    let products = read_csv(&sink.path_for("mockshop", Tier::Products));
    let names: Vec<&str> = products.iter().map(|row| row[2].as_str()).collect();
    assert_eq!(names, vec!["Blazer", "Jumper", "Polo"]);
    let ids: Vec<&str> = products.iter().map(|row| row[0].as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2"]);
    let school_ids: Vec<&str> = products.iter().map(|row| row[1].as_str()).collect();
    assert_eq!(school_ids, vec!["0", "1", "1"]);
    assert_eq!(products[0][5], format!("{}/img/blazer.jpg", base_url));

    // Variants: three blazer sizes, two jumper sizes, nothing for the polo
    let variants = read_csv(&sink.path_for("mockshop", Tier::Variants));
    assert_eq!(variants.len(), 5);
    assert_eq!(variants[0][2], "30\"");
    assert_eq!(variants[0][3], "£35.00");
    assert_eq!(variants[0][5], "Dry clean");
    assert_eq!(variants[4][1], "1");
    assert_eq!(variants[4][2], "Age 7");
    assert_eq!(variants[4][4], "Wool blend");

    // The polo page was saved for inspection
    let snapshot = std::fs::read_to_string(snapshot_dir.join("mockshop_product_2.html"))
        .expect("Snapshot missing");
    assert!(snapshot.contains("Out of stock"));

    let report = &output.report;
    assert_eq!(report.config_hash.as_deref(), Some("test-hash"));
    let products_report = report.tier(Tier::Products).unwrap();
    assert_eq!(products_report.skip_reasons["not-found"], 1);
    assert_eq!(products_report.expansions, 1);
    assert_eq!(report.tier(Tier::Variants).unwrap().skip_reasons["no-control"], 1);

    let summary = summary_path(output_dir.path(), &report.supplier);
    generate_markdown_summary(report, &summary).expect("Failed to write summary");
    let markdown = std::fs::read_to_string(summary).unwrap();
    assert!(markdown.contains("| variants | 5 | 1 |"));
}

#[tokio::test]
async fn test_depth_cutoff_exports_only_reached_tiers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let output_dir = TempDir::new().expect("Failed to create temp dir");
    let crawler = CatalogCrawler::new(create_test_site(&base_url), test_settings());
    let mut driver = HttpDriver::new(&DriverConfig::default()).unwrap();
    let mut sink = CsvSink::new(output_dir.path());

    let output = crawler
        .crawl(&mut driver, &mut sink, Depth::Products)
        .await
        .unwrap();

    assert!(sink.path_for("mockshop", Tier::Schools).exists());
    assert!(sink.path_for("mockshop", Tier::Products).exists());
    assert!(!sink.path_for("mockshop", Tier::Variants).exists());
    assert!(output.variants.is_none());

    // No product page was requested
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/product/")));
}

#[tokio::test]
async fn test_missing_school_listing_aborts_tier() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/schools"))
        .respond_with(html("<p>Maintenance</p>".to_string()))
        .mount(&mock_server)
        .await;

    let output_dir = TempDir::new().unwrap();
    let crawler = CatalogCrawler::new(create_test_site(&base_url), test_settings());
    let mut driver = HttpDriver::new(&DriverConfig::default()).unwrap();
    let mut sink = CsvSink::new(output_dir.path());

    let output = crawler
        .crawl(&mut driver, &mut sink, Depth::Products)
        .await
        .unwrap();

    assert!(output.schools.is_empty());
    assert!(output.report.tier(Tier::Schools).unwrap().aborted);
    assert!(sink.path_for("mockshop", Tier::Schools).exists());
    assert_eq!(output.products.map(|p| p.len()), Some(0));
}

#[test]
fn test_config_site_overrides_builtin() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[crawl]
record-policy = "null-pad"

[[site]]
name = "monkhouse"
title = "Monkhouse (staging)"

[site.schools]
source = { fixed = "https://staging.example.com/school" }
name = { selector = "a" }
store-page = { selector = "a", extract = { attribute = "href" } }

[site.schools.listing]
item = ".school"
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).expect("Failed to load config");
    let mut registry = SiteRegistry::builtin().unwrap();
    let builtin_count = registry.len();
    registry.extend(config.site.clone());

    assert_eq!(registry.len(), builtin_count);
    let site = registry.get("monkhouse").unwrap();
    assert_eq!(site.display_name(), "Monkhouse (staging)");
    assert!(site.products.is_none());
}

#[test]
fn test_unknown_supplier_lists_known_names() {
    let registry = SiteRegistry::builtin().unwrap();
    let err = registry.get("nosuchshop").unwrap_err();

    assert!(matches!(err, HarvestError::UnknownSupplier { .. }));
    let message = err.to_string();
    assert!(message.contains("nosuchshop"));
    assert!(message.contains("asda"));
    assert!(message.contains("uniformdirect"));
}
