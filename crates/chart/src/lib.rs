pub mod plots;

pub use plots::{ChartRenderer, PlottersRenderer, chart_path, marker_color};
