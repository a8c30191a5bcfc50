//! TCGplayer-specific functionality: listing, pricing API, image CDN.

pub mod client;
pub mod lister;
pub mod models;
pub mod selectors;

pub use client::{CatalogApi, TcgClient};
pub use lister::{collect_product_ids, extract_product_ids, BrowserStorefront, Storefront};
pub use models::{PriceError, PriceHistory, PricePoint};
