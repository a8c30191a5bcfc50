//! HTTP client for the TCGplayer pricing API and image CDN, using wreq for
//! TLS fingerprint emulation.

use crate::config::Config;
use crate::tcgplayer::models::{parse_price_history, PriceError, PriceHistory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Trait for price history and thumbnail fetching - enables mocking for
/// tests.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetches the price history for one product.
    ///
    /// Network failures, non-success statuses, and absent data structures are
    /// soft failures that yield an empty history; a malformed bucket is a
    /// hard [`PriceError`] and the caller must skip the product.
    async fn price_history(&self, product_id: &str) -> Result<PriceHistory, PriceError>;

    /// Downloads and decodes the product thumbnail. Any failure is soft and
    /// yields `None`; the chart is then drawn without an inset.
    async fn thumbnail(&self, product_id: &str) -> Option<DynamicImage>;
}

/// TCGplayer HTTP client with browser impersonation and a politeness delay.
pub struct TcgClient {
    client: Client,
    price_api_base: String,
    cdn_base: String,
    range: String,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl TcgClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_urls(config, None, None)
    }

    /// Creates a new client with custom API/CDN base URLs (for testing).
    pub fn with_base_urls(
        config: &Config,
        price_api_base: Option<String>,
        cdn_base: Option<String>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            price_api_base: price_api_base.unwrap_or_else(|| config.price_api_base.clone()),
            cdn_base: cdn_base.unwrap_or_else(|| config.cdn_base.clone()),
            range: config.range.clone(),
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        })
    }

    /// Adds a random delay to mimic human behavior.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl CatalogApi for TcgClient {
    async fn price_history(&self, product_id: &str) -> Result<PriceHistory, PriceError> {
        let url =
            format!("{}/{}/detailed?range={}", self.price_api_base, product_id, self.range);

        self.delay().await;
        info!("Fetching price history: {}", product_id);
        debug!("GET {}", url);

        let response = match self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching price data for product {}: {}", product_id, e);
                return Ok(PriceHistory::empty(product_id));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Error fetching price data for product {}: {}", product_id, status);
            return Ok(PriceHistory::empty(product_id));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Error reading price response for product {}: {}", product_id, e);
                return Ok(PriceHistory::empty(product_id));
            }
        };

        parse_price_history(product_id, &body)
    }

    async fn thumbnail(&self, product_id: &str) -> Option<DynamicImage> {
        let url = format!("{}/product/{}_in_200x200.jpg", self.cdn_base, product_id);

        self.delay().await;
        debug!("GET {}", url);

        let response = match self.client.get(&url).emulation(Emulation::Chrome131).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Error fetching image for product {}: {}", product_id, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Error fetching image for product {}: {}", product_id, status);
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error reading image bytes for product {}: {}", product_id, e);
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!("Error decoding image for product {}: {}", product_id, e);
                None
            }
        }
    }
}
