//! tcg-charts - Batch CLI that charts TCGplayer price history per product
//!
//! Lists products from rendered search pages, fetches per-product price
//! history and thumbnails, and renders price-over-time charts standalone or
//! tiled.

pub mod chart;
pub mod commands;
pub mod config;
pub mod tcgplayer;

pub use chart::{ChartStyle, ProductChart};
pub use config::Config;
pub use tcgplayer::{PriceError, PriceHistory, PricePoint};
