//! Product listing through a controlled browser session.
//!
//! The search grid is rendered client-side, so a plain GET returns no
//! thumbnails; a headless Chrome tab loads the page and blocks until the
//! product images exist in the DOM.

use crate::config::Config;
use crate::tcgplayer::selectors;
use anyhow::{Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder};
use scraper::Html;
use std::ffi::OsStr;
use std::time::Duration;
use tracing::{debug, info};

/// Trait for fetching rendered search-results pages - enables mocking for
/// tests without a browser.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// Returns the rendered HTML of one search-results page.
    async fn listing_html(&self, query: &str, page: u32) -> Result<String>;
}

/// Storefront backed by a single headless Chrome session, reused across all
/// listing calls for the run.
pub struct BrowserStorefront {
    browser: Browser,
    base_url: String,
    product_line: String,
    wait_timeout: Duration,
}

impl BrowserStorefront {
    /// Launches a headless browser session configured from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(true)
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--no-sandbox"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser launch options: {}", e))?;

        let browser = Browser::new(options).context("Failed to launch headless browser")?;

        Ok(Self {
            browser,
            base_url: config.search_base.clone(),
            product_line: config.product_line.clone(),
            wait_timeout: Duration::from_secs(config.listing_timeout_secs),
        })
    }

    /// Builds the search-results URL for one page.
    fn page_url(&self, query: &str, page: u32) -> String {
        format!(
            "{}/search/{}/product?productLineName={}&Language=English&q={}&view=grid&page={}",
            self.base_url,
            self.product_line,
            self.product_line,
            urlencoding::encode(query),
            page
        )
    }
}

#[async_trait]
impl Storefront for BrowserStorefront {
    async fn listing_html(&self, query: &str, page: u32) -> Result<String> {
        let url = self.page_url(query, page);
        let browser = self.browser.clone();
        let timeout = self.wait_timeout;

        info!("Listing page {} for query: {}", page, query);
        debug!("GET {}", url);

        // headless_chrome is synchronous; keep the tab work off the async
        // runtime threads.
        tokio::task::spawn_blocking(move || -> Result<String> {
            let tab = browser.new_tab().context("Failed to open browser tab")?;
            tab.navigate_to(&url).context("Failed to navigate to search page")?;

            // Block until the product grid has rendered. A timeout here is
            // fatal to the run: the caller cannot otherwise distinguish "no
            // products" from "page never loaded".
            tab.wait_for_element_with_custom_timeout(selectors::PRODUCT_THUMBNAIL_CSS, timeout)
                .context("Timed out waiting for product thumbnails")?;

            tab.get_content().context("Failed to read rendered page content")
        })
        .await
        .context("Listing task panicked")?
    }
}

/// Extracts product identifiers from rendered search-page HTML, in DOM order.
///
/// An identifier is the `src` path segment between `/product/` and the first
/// underscore. Thumbnails whose `src` is missing or does not carry the
/// product path marker are silently skipped.
pub fn extract_product_ids(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let ids: Vec<String> = document
        .select(&selectors::PRODUCT_THUMBNAIL)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(parse_product_id)
        .collect();

    debug!("Extracted {} product id(s) from listing page", ids.len());
    ids
}

/// Lists product identifiers across search pages.
///
/// Pages accumulate: every page's identifiers are kept, duplicates dropped
/// with the first occurrence winning, order otherwise preserved. A listing
/// failure on any page (timeout included) is fatal - a partial listing would
/// be indistinguishable from a short one. Zero pages is an empty listing.
pub async fn collect_product_ids(
    storefront: &impl Storefront,
    query: &str,
    pages: u32,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for page in 1..=pages {
        let html = storefront.listing_html(query, page).await?;
        for id in extract_product_ids(&html) {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
    }

    info!("Found {} product(s) for query: {}", ids.len(), query);
    Ok(ids)
}

/// Pulls the product identifier out of a thumbnail URL, if it carries one.
fn parse_product_id(src: &str) -> Option<String> {
    let (_, tail) = src.split_once(selectors::PRODUCT_PATH_MARKER)?;
    let id = match tail.split_once('_') {
        Some((head, _)) => head,
        None => tail,
    };
    if id.is_empty() { None } else { Some(id.to_string()) }
}
