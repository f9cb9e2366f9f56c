//! Sequential color scales shared by the raster and interactive charts.

use plotters::style::RGBColor;
use serde_json::{json, Value};

/// Bar fill of the top-10 chart.
pub const BAR_BLUE: RGBColor = RGBColor(99, 110, 250);
/// Bar fill of the treatment-gap chart.
pub const GAP_RED: RGBColor = RGBColor(255, 0, 0);
/// Region outline on choropleth maps.
pub const OUTLINE: RGBColor = RGBColor(255, 255, 255);
/// Fill for regions whose value is not finite.
pub const NO_DATA: RGBColor = RGBColor(220, 220, 220);

/// Named sequential color scale with evenly spaced stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    /// ColorBrewer OrRd, light orange to dark red
    OrRd,
    /// ColorBrewer Blues
    Blues,
}

const OR_RD: [(u8, u8, u8); 9] = [
    (255, 247, 236),
    (254, 232, 200),
    (253, 212, 158),
    (253, 187, 132),
    (252, 141, 89),
    (239, 101, 72),
    (215, 48, 31),
    (179, 0, 0),
    (127, 0, 0),
];

const BLUES: [(u8, u8, u8); 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

impl ColorScale {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScale::OrRd => &OR_RD,
            ColorScale::Blues => &BLUES,
        }
    }

    /// Color at position `t` in `[0, 1]`, linearly interpolated between stops.
    pub fn at(&self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 1);
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = scaled - lower as f64;

        let mix = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * frac).round() as u8 };
        let (a, b) = (stops[lower], stops[upper]);
        RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
    }

    /// Color for `value` on the range `[min, max]`.
    pub fn color_for(&self, value: f64, min: f64, max: f64) -> RGBColor {
        if !value.is_finite() {
            return NO_DATA;
        }
        let span = max - min;
        if span <= 0.0 || !span.is_finite() {
            return self.at(0.5);
        }
        self.at((value - min) / span)
    }

    /// The scale as a plotly `colorscale` array.
    pub fn to_plotly(&self) -> Value {
        let stops = self.stops();
        let last = (stops.len() - 1) as f64;
        Value::Array(
            stops
                .iter()
                .enumerate()
                .map(|(i, (r, g, b))| json!([i as f64 / last, format!("rgb({r},{g},{b})")]))
                .collect(),
        )
    }
}

/// CSS hex form of a color, e.g. `#ff0000`.
pub fn hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}
