//! Chart command: the full page-to-chart pipeline.

use crate::chart::{self, ChartStyle, ProductChart};
use crate::config::Config;
use crate::tcgplayer::{
    collect_product_ids, BrowserStorefront, CatalogApi, Storefront, TcgClient,
};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// How charts are laid out: one PNG per product, or every product tiled
/// into one combined PNG. A caller choice, not a per-product property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Standalone,
    Tiled,
}

/// Executes the listing -> price fetch -> image fetch -> render pipeline.
pub struct ChartCommand {
    config: Config,
}

impl ChartCommand {
    /// Creates a new chart command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the pipeline against the live storefront and API.
    pub async fn execute(&self, query: &str, mode: RenderMode) -> Result<String> {
        let storefront =
            BrowserStorefront::new(&self.config).context("Failed to start browser session")?;
        let api = TcgClient::new(&self.config).context("Failed to create HTTP client")?;

        self.execute_with_sources(&storefront, &api, query, mode).await
    }

    /// Runs the pipeline with provided sources (for testing).
    pub async fn execute_with_sources(
        &self,
        storefront: &impl Storefront,
        api: &impl CatalogApi,
        query: &str,
        mode: RenderMode,
    ) -> Result<String> {
        let ids = collect_product_ids(storefront, query, self.config.pages).await?;

        if ids.is_empty() {
            return Ok("No products found".to_string());
        }

        std::fs::create_dir_all(&self.config.out_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.config.out_dir.display())
        })?;

        match mode {
            RenderMode::Standalone => self.render_standalone(api, &ids).await,
            RenderMode::Tiled => self.render_tiled(api, &ids).await,
        }
    }

    /// One chart file per product; products without usable data are skipped.
    async fn render_standalone(&self, api: &impl CatalogApi, ids: &[String]) -> Result<String> {
        let style = ChartStyle::from_config(&self.config);
        let mut rendered = 0;
        let mut skipped = 0;

        for id in ids {
            info!("Processing product ID {}", id);

            let Some(product) = self.fetch_product(api, id).await else {
                skipped += 1;
                continue;
            };

            let path = self.standalone_path(id);
            match chart::render_standalone(&path, &product, &style)? {
                Some(picker) => {
                    debug!("Chart for {} has {} hoverable point(s)", id, picker.len());
                    rendered += 1;
                }
                None => skipped += 1,
            }
        }

        Ok(format!(
            "Rendered {} chart(s) to {} ({} skipped)",
            rendered,
            self.config.out_dir.display(),
            skipped
        ))
    }

    /// All products pre-computed into one shared grid of subplots.
    async fn render_tiled(&self, api: &impl CatalogApi, ids: &[String]) -> Result<String> {
        let style = ChartStyle::from_config(&self.config);
        let mut products = Vec::new();
        let mut skipped = 0;

        for id in ids {
            info!("Processing product ID {}", id);

            match self.fetch_product(api, id).await {
                Some(product) => products.push(product),
                None => skipped += 1,
            }
        }

        let path = self.config.out_dir.join("combined_market_price_graphs.png");
        let drawn = chart::render_tiled(&path, &products, &style)?;

        if drawn == 0 {
            return Ok("No charts produced: no product had price data".to_string());
        }

        Ok(format!(
            "Rendered {} chart(s) into {} ({} empty, {} skipped)",
            drawn,
            path.display(),
            products.len() - drawn,
            skipped
        ))
    }

    /// Fetches one product's series and thumbnail. Returns `None` when the
    /// price fetch fails hard; an empty series still yields a product so the
    /// renderer can log the skip (and, in tiled mode, reserve the cell).
    async fn fetch_product(&self, api: &impl CatalogApi, id: &str) -> Option<ProductChart> {
        let history = match api.price_history(id).await {
            Ok(history) => history,
            Err(e) => {
                warn!("Skipping product {}: {}", id, e);
                return None;
            }
        };

        let thumbnail = api.thumbnail(id).await;
        Some(ProductChart::new(history, thumbnail))
    }

    fn standalone_path(&self, id: &str) -> PathBuf {
        self.config.out_dir.join(format!("product_{}_market_price_graph.png", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcgplayer::models::{parse_price_history, PriceError, PriceHistory};
    use async_trait::async_trait;
    use image::DynamicImage;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct MockStorefront {
        pages: Vec<String>,
    }

    #[async_trait]
    impl Storefront for MockStorefront {
        async fn listing_html(&self, _query: &str, page: u32) -> Result<String> {
            Ok(self.pages.get((page - 1) as usize).cloned().unwrap_or_default())
        }
    }

    /// Serves canned API bodies per product id; ids with no body behave like
    /// an HTTP error (soft empty).
    struct MockCatalogApi {
        bodies: HashMap<String, String>,
        thumbnails: Vec<String>,
    }

    #[async_trait]
    impl CatalogApi for MockCatalogApi {
        async fn price_history(&self, product_id: &str) -> Result<PriceHistory, PriceError> {
            match self.bodies.get(product_id) {
                Some(body) => parse_price_history(product_id, body),
                None => Ok(PriceHistory::empty(product_id)),
            }
        }

        async fn thumbnail(&self, product_id: &str) -> Option<DynamicImage> {
            if self.thumbnails.iter().any(|id| id == product_id) {
                Some(DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
                    8,
                    8,
                    image::Rgb([128, 128, 128]),
                )))
            } else {
                None
            }
        }
    }

    fn listing_page(ids: &[&str]) -> String {
        let mut html = String::from("<html><body>");
        for id in ids {
            html.push_str(&format!(
                r#"<div class="lazy-image__wrapper"><img src="https://cdn/product/{}_in_200x200.jpg"></div>"#,
                id
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn two_point_body() -> String {
        r#"{"result":[{"buckets":[
            {"marketPrice":"12.50","bucketStartDate":"2024-03-01"},
            {"marketPrice":"13.00","bucketStartDate":"2024-03-08"}
        ]}]}"#
            .to_string()
    }

    fn malformed_body() -> String {
        r#"{"result":[{"buckets":[
            {"marketPrice":"12.50","bucketStartDate":"bogus"}
        ]}]}"#
            .to_string()
    }

    fn make_test_config(out_dir: &TempDir) -> Config {
        Config {
            out_dir: out_dir.path().to_path_buf(),
            delay_ms: 0,
            delay_jitter_ms: 0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_standalone_renders_one_file_per_product() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec![listing_page(&["111", "222"])] };
        let api = MockCatalogApi {
            bodies: HashMap::from([
                ("111".to_string(), two_point_body()),
                ("222".to_string(), two_point_body()),
            ]),
            thumbnails: vec!["111".to_string()],
        };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output = cmd
            .execute_with_sources(&storefront, &api, "etb", RenderMode::Standalone)
            .await
            .unwrap();

        assert!(output.contains("Rendered 2 chart(s)"));
        assert!(dir.path().join("product_111_market_price_graph.png").exists());
        assert!(dir.path().join("product_222_market_price_graph.png").exists());
    }

    #[tokio::test]
    async fn test_standalone_skips_product_with_no_price_data() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec![listing_page(&["111", "404"])] };
        let api = MockCatalogApi {
            bodies: HashMap::from([("111".to_string(), two_point_body())]),
            thumbnails: Vec::new(),
        };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output = cmd
            .execute_with_sources(&storefront, &api, "etb", RenderMode::Standalone)
            .await
            .unwrap();

        assert!(output.contains("Rendered 1 chart(s)"));
        assert!(output.contains("1 skipped"));
        assert!(!dir.path().join("product_404_market_price_graph.png").exists());
    }

    #[tokio::test]
    async fn test_standalone_skips_product_with_malformed_bucket() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec![listing_page(&["111", "666"])] };
        let api = MockCatalogApi {
            bodies: HashMap::from([
                ("111".to_string(), two_point_body()),
                ("666".to_string(), malformed_body()),
            ]),
            thumbnails: Vec::new(),
        };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output = cmd
            .execute_with_sources(&storefront, &api, "etb", RenderMode::Standalone)
            .await
            .unwrap();

        // The malformed product is skipped but the run continues.
        assert!(output.contains("Rendered 1 chart(s)"));
        assert!(dir.path().join("product_111_market_price_graph.png").exists());
        assert!(!dir.path().join("product_666_market_price_graph.png").exists());
    }

    #[tokio::test]
    async fn test_tiled_renders_combined_file() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec![listing_page(&["1", "2", "3"])] };
        let api = MockCatalogApi {
            bodies: HashMap::from([
                ("1".to_string(), two_point_body()),
                ("2".to_string(), two_point_body()),
                ("3".to_string(), two_point_body()),
            ]),
            thumbnails: vec!["2".to_string()],
        };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output =
            cmd.execute_with_sources(&storefront, &api, "etb", RenderMode::Tiled).await.unwrap();

        assert!(output.contains("Rendered 3 chart(s)"));
        assert!(dir.path().join("combined_market_price_graphs.png").exists());
    }

    #[tokio::test]
    async fn test_tiled_with_no_price_data_produces_nothing() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec![listing_page(&["1", "2"])] };
        let api = MockCatalogApi { bodies: HashMap::new(), thumbnails: Vec::new() };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output =
            cmd.execute_with_sources(&storefront, &api, "etb", RenderMode::Tiled).await.unwrap();

        assert!(output.contains("No charts produced"));
        assert!(!dir.path().join("combined_market_price_graphs.png").exists());
    }

    #[tokio::test]
    async fn test_empty_listing_reports_no_products() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront { pages: vec!["<html></html>".to_string()] };
        let api = MockCatalogApi { bodies: HashMap::new(), thumbnails: Vec::new() };

        let cmd = ChartCommand::new(make_test_config(&dir));
        let output = cmd
            .execute_with_sources(&storefront, &api, "etb", RenderMode::Standalone)
            .await
            .unwrap();

        assert_eq!(output, "No products found");
    }

    #[tokio::test]
    async fn test_multi_page_listing_accumulates() {
        let dir = TempDir::new().unwrap();
        let storefront = MockStorefront {
            pages: vec![listing_page(&["1"]), listing_page(&["1", "2"])],
        };
        let api = MockCatalogApi {
            bodies: HashMap::from([
                ("1".to_string(), two_point_body()),
                ("2".to_string(), two_point_body()),
            ]),
            thumbnails: Vec::new(),
        };

        let mut config = make_test_config(&dir);
        config.pages = 2;

        let cmd = ChartCommand::new(config);
        let output = cmd
            .execute_with_sources(&storefront, &api, "etb", RenderMode::Standalone)
            .await
            .unwrap();

        assert!(output.contains("Rendered 2 chart(s)"));
        assert!(dir.path().join("product_1_market_price_graph.png").exists());
        assert!(dir.path().join("product_2_market_price_graph.png").exists());
    }
}
