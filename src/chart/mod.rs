//! Price-over-time chart rendering with plotters.
//!
//! Two modes share one drawing routine: standalone writes one PNG per
//! product, tiled pre-computes every product into a shared grid of subplots
//! inside a single PNG.

pub mod tooltip;

use crate::config::Config;
use crate::tcgplayer::models::PriceHistory;
use anyhow::{anyhow, Result};
use chrono::Duration;
use image::DynamicImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;
use tracing::{debug, info};

pub use tooltip::{tooltip_text, PointPicker, DEFAULT_PICK_RADIUS};

/// Pixel padding between the thumbnail inset and the drawing-area edge.
const INSET_MARGIN: i32 = 10;

/// Chart geometry, taken from the configuration.
#[derive(Debug, Clone)]
pub struct ChartStyle {
    /// Figure width (standalone) or total grid width (tiled)
    pub width: u32,
    /// Figure height (standalone) or per-row height (tiled)
    pub height: u32,
    /// Edge length of the thumbnail inset
    pub inset_size: u32,
}

impl ChartStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            width: config.chart_width,
            height: config.chart_height,
            inset_size: config.inset_size,
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self { width: 1000, height: 600, inset_size: 160 }
    }
}

/// Everything the renderer needs for one product: the price series and an
/// optional decoded thumbnail. The image is owned here and discarded with
/// the chart.
#[derive(Debug)]
pub struct ProductChart {
    pub history: PriceHistory,
    pub thumbnail: Option<DynamicImage>,
}

impl ProductChart {
    pub fn new(history: PriceHistory, thumbnail: Option<DynamicImage>) -> Self {
        Self { history, thumbnail }
    }

    pub fn product_id(&self) -> &str {
        &self.history.product_id
    }
}

/// Subplot grid for tiled mode: 2 columns, ceil(n / 2) rows.
pub fn grid_dims(products: usize) -> (usize, usize) {
    (products.div_ceil(2), 2)
}

/// Renders one product to its own PNG file.
///
/// Returns the hover picker for the plotted points, or `None` (and no
/// artifact) when the price series is empty.
pub fn render_standalone(
    path: &Path,
    product: &ProductChart,
    style: &ChartStyle,
) -> Result<Option<PointPicker>> {
    if product.history.is_empty() {
        info!(
            "No price data available for product {}. Skipping graph generation.",
            product.product_id()
        );
        return Ok(None);
    }

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("Failed to fill canvas: {}", e))?;

    let picker = draw_price_chart(&root, product, style.inset_size)?;

    root.present().map_err(|e| anyhow!("Failed to render chart: {}", e))?;
    debug!("Wrote {}", path.display());

    Ok(picker)
}

/// Renders every product as one cell of a shared subplot grid in a single
/// PNG file. Products with an empty series leave their cell blank; trailing
/// cells stay unused.
///
/// Returns the number of cells actually drawn. When no product has any
/// price data (the list is empty or every series is), no artifact is
/// produced.
pub fn render_tiled(path: &Path, products: &[ProductChart], style: &ChartStyle) -> Result<usize> {
    if products.iter().all(|p| p.history.is_empty()) {
        // Nothing would be drawn; opening the backend here would still
        // flush an all-white PNG on present.
        info!("No products with price data to chart. Skipping combined graph generation.");
        return Ok(0);
    }

    let (rows, cols) = grid_dims(products.len());
    let total_height = style.height * rows as u32;

    let root = BitMapBackend::new(path, (style.width, total_height)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("Failed to fill canvas: {}", e))?;

    let cells = root.split_evenly((rows, cols));
    let cell_inset = style.inset_size.min(style.width / (cols as u32 * 4));

    let mut drawn = 0;
    for (product, cell) in products.iter().zip(cells.iter()) {
        if draw_price_chart(cell, product, cell_inset)?.is_some() {
            drawn += 1;
        }
    }

    root.present().map_err(|e| anyhow!("Failed to render combined chart: {}", e))?;
    debug!("Wrote {} ({} of {} cells drawn)", path.display(), drawn, rows * cols);

    Ok(drawn)
}

/// Draws one product's chart into the given drawing area.
///
/// Returns `None` without touching the area when the series is empty.
fn draw_price_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    product: &ProductChart,
    inset_size: u32,
) -> Result<Option<PointPicker>> {
    let history = &product.history;
    let (Some((mut min_date, mut max_date)), Some((min_price, max_price))) =
        (history.date_range(), history.price_range())
    else {
        info!(
            "No price data available for product {}. Skipping graph generation.",
            product.product_id()
        );
        return Ok(None);
    };

    if min_date == max_date {
        // A single bucket would give the axis a zero-width range.
        min_date = min_date - Duration::days(1);
        max_date = max_date + Duration::days(1);
    }

    let padding = (max_price - min_price).max(1e-8) * 0.1;
    let y_min = (min_price - padding).max(0.0);
    let y_max = max_price + padding;

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Market Price Over Time for Product {}", product.product_id()),
            ("sans-serif", 18),
        )
        .margin(10)
        .x_label_area_size(70)
        .y_label_area_size(50)
        .build_cartesian_2d(min_date..max_date, y_min..y_max)
        .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

    // Roughly one major tick per week, ISO-formatted, rotated so long date
    // labels stay legible.
    let weeks = ((max_date - min_date).num_days() / 7).max(1) as usize;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price")
        .x_labels(weeks + 1)
        .x_label_formatter(&|d| d.format("%Y-%m-%d").to_string())
        .x_label_style(
            ("sans-serif", 11)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()
        .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;

    let series = history.points.iter().map(|p| (p.date, p.price));
    chart
        .draw_series(LineSeries::new(series, &BLUE))
        .map_err(|e| anyhow!("Failed to draw line: {}", e))?
        .label("Market Price")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(
            history.points.iter().map(|p| Circle::new((p.date, p.price), 3, BLUE.filled())),
        )
        .map_err(|e| anyhow!("Failed to draw points: {}", e))?;

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| anyhow!("Failed to draw legend: {}", e))?;

    if let Some(thumbnail) = &product.thumbnail {
        draw_inset(area, thumbnail, inset_size)?;
    }

    let picker = PointPicker::new(
        history
            .points
            .iter()
            .map(|p| (chart.backend_coord(&(p.date, p.price)), p.clone()))
            .collect(),
        DEFAULT_PICK_RADIUS,
    );

    Ok(Some(picker))
}

/// Overlays the thumbnail as a fixed-size inset anchored to the upper-right
/// corner of the drawing area, with no axis decoration.
fn draw_inset<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    thumbnail: &DynamicImage,
    inset_size: u32,
) -> Result<()> {
    let size = inset_size.max(1);
    let resized = thumbnail.resize_exact(size, size, image::imageops::FilterType::Triangle);

    let (area_width, _) = area.dim_in_pixel();
    let x = (area_width as i32 - size as i32 - INSET_MARGIN).max(0);
    let y = INSET_MARGIN;

    let inset: BitMapElement<(i32, i32)> = ((x, y), resized).into();
    area.draw(&inset).map_err(|e| anyhow!("Failed to draw thumbnail inset: {}", e))?;

    Ok(())
}
