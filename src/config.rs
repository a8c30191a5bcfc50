//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Product line searched (path + query segment of the search URL)
    #[serde(default = "default_product_line")]
    pub product_line: String,

    /// Price history window requested from the API
    #[serde(default = "default_range")]
    pub range: String,

    /// Number of search pages to list
    #[serde(default = "default_pages")]
    pub pages: u32,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Seconds to wait for product thumbnails to render before aborting
    #[serde(default = "default_listing_timeout_secs")]
    pub listing_timeout_secs: u64,

    /// Directory chart PNGs are written to
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Chart width in pixels (per figure in standalone mode, total in tiled)
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    /// Chart height in pixels (per figure in standalone mode, per row in tiled)
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,

    /// Edge length of the thumbnail inset in pixels
    #[serde(default = "default_inset_size")]
    pub inset_size: u32,

    /// Search storefront base URL
    #[serde(default = "default_search_base")]
    pub search_base: String,

    /// Price history API base URL
    #[serde(default = "default_price_api_base")]
    pub price_api_base: String,

    /// Image CDN base URL
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,
}

fn default_product_line() -> String {
    "pokemon".to_string()
}

fn default_range() -> String {
    "quarter".to_string()
}

fn default_pages() -> u32 {
    1
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    500
}

fn default_listing_timeout_secs() -> u64 {
    20
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_chart_width() -> u32 {
    1000
}

fn default_chart_height() -> u32 {
    600
}

fn default_inset_size() -> u32 {
    160
}

fn default_search_base() -> String {
    "https://www.tcgplayer.com".to_string()
}

fn default_price_api_base() -> String {
    "https://infinite-api.tcgplayer.com/price/history".to_string()
}

fn default_cdn_base() -> String {
    "https://tcgplayer-cdn.tcgplayer.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            product_line: default_product_line(),
            range: default_range(),
            pages: default_pages(),
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            listing_timeout_secs: default_listing_timeout_secs(),
            out_dir: default_out_dir(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
            inset_size: default_inset_size(),
            search_base: default_search_base(),
            price_api_base: default_price_api_base(),
            cdn_base: default_cdn_base(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("tcg-charts").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(proxy) = std::env::var("TCG_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("TCG_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(out_dir) = std::env::var("TCG_OUT_DIR") {
            self.out_dir = PathBuf::from(out_dir);
        }

        self
    }
}
