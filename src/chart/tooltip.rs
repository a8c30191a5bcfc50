//! Hover tooltip machinery for interactive display sessions.
//!
//! The saved PNG is static; hovering is a display-time concern. The renderer
//! hands back a [`PointPicker`] holding the pixel position of every plotted
//! point so a front end can hit-test pointer motion and show the nearest
//! point's label, without the picker being part of the artifact itself.

use crate::tcgplayer::models::{PricePoint, DATE_FORMAT};

/// Default hit-test radius in pixels around a plotted point.
pub const DEFAULT_PICK_RADIUS: u32 = 8;

/// Maps backend pixel positions to plotted price points.
#[derive(Debug, Clone)]
pub struct PointPicker {
    points: Vec<((i32, i32), PricePoint)>,
    radius: i32,
}

impl PointPicker {
    /// Creates a picker over the given pixel-position/point pairs.
    pub fn new(points: Vec<((i32, i32), PricePoint)>, radius: u32) -> Self {
        Self { points, radius: radius as i32 }
    }

    /// Returns the plotted point nearest to the pointer, if the pointer is
    /// within the pick radius of one.
    pub fn pick(&self, x: i32, y: i32) -> Option<&PricePoint> {
        let limit = self.radius * self.radius;
        self.points
            .iter()
            .map(|((px, py), point)| {
                let (dx, dy) = (px - x, py - y);
                (dx * dx + dy * dy, point)
            })
            .filter(|(dist, _)| *dist <= limit)
            .min_by_key(|(dist, _)| *dist)
            .map(|(_, point)| point)
    }

    /// Returns the number of plotted points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if nothing was plotted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Formats the floating annotation shown next to a hovered point.
pub fn tooltip_text(point: &PricePoint) -> String {
    format!("Date: {}\nPrice: ${:.2}", point.date.format(DATE_FORMAT), point.price)
}
