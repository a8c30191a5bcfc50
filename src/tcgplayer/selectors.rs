//! CSS selectors for TCGplayer search-results pages.
//!
//! **Update process**: when listing stops finding thumbnails, capture an HTML
//! sample from a rendered search page, update the selectors here, and add a
//! test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Thumbnail images inside the lazily rendered product grid. This is both
/// the element the browser session waits for and the element identifiers
/// are extracted from.
pub static PRODUCT_THUMBNAIL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.lazy-image__wrapper img").unwrap());

/// Raw CSS string for [`PRODUCT_THUMBNAIL`], for the browser wait call.
pub const PRODUCT_THUMBNAIL_CSS: &str = "div.lazy-image__wrapper img";

/// Path marker inside a thumbnail `src` that identifies a product image.
pub const PRODUCT_PATH_MARKER: &str = "/product/";
