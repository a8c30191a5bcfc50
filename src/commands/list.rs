//! List command: run the lister only and print the extracted identifiers.

use crate::config::Config;
use crate::tcgplayer::{collect_product_ids, BrowserStorefront, Storefront};
use anyhow::{Context, Result};

/// Lists product identifiers for a search query without charting them.
pub struct ListCommand {
    config: Config,
}

impl ListCommand {
    /// Creates a new list command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Lists against the live storefront.
    pub async fn execute(&self, query: &str) -> Result<String> {
        let storefront =
            BrowserStorefront::new(&self.config).context("Failed to start browser session")?;

        self.execute_with_storefront(&storefront, query).await
    }

    /// Lists with a provided storefront (for testing).
    pub async fn execute_with_storefront(
        &self,
        storefront: &impl Storefront,
        query: &str,
    ) -> Result<String> {
        let ids = collect_product_ids(storefront, query, self.config.pages).await?;

        if ids.is_empty() {
            return Ok("No products found".to_string());
        }

        Ok(ids.join("\n"))
    }
}
