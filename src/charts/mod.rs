//! Charts module - static and interactive chart rendering

pub mod bar;
pub mod choropleth;
pub mod interactive;
pub mod palette;
mod raster;

pub use bar::BarChart;
pub use choropleth::{ChoroplethMap, MapRegion};
pub use palette::ColorScale;
pub use raster::{font, render_rgb, save_jpeg, Canvas, RenderError};
