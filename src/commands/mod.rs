//! CLI command implementations.

pub mod chart;
pub mod list;

pub use chart::{ChartCommand, RenderMode};
pub use list::ListCommand;
