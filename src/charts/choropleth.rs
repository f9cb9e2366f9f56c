//! Choropleth Map Module
//! Shades each region's boundary by one indicator value.

use crate::charts::palette::{ColorScale, OUTLINE};
use crate::charts::raster::{font, Canvas, RenderError};
use crate::config::ImageSize;
use crate::geo::{Boundaries, BoundaryFeature, Equirectangular};
use crate::stats::{IndicatorTable, RegionIndicators};
use log::warn;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Share of the image width given to the map; the rest holds the colorbar.
const MAP_WIDTH_FRACTION: f64 = 0.86;
const COLORBAR_STEPS: i32 = 120;
const COLORBAR_TICKS: usize = 5;

/// One shaded region.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRegion<'a> {
    pub name: String,
    pub value: f64,
    pub feature: &'a BoundaryFeature,
}

/// A map with one shaded feature per region that has a boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethMap<'a> {
    pub title: String,
    /// Colorbar caption
    pub value_label: String,
    pub scale: ColorScale,
    pub regions: Vec<MapRegion<'a>>,
}

impl<'a> ChoroplethMap<'a> {
    /// Match `values` to boundary features by exact name.
    ///
    /// Regions without a boundary are left off the map and logged.
    pub fn new(
        title: &str,
        value_label: &str,
        scale: ColorScale,
        values: Vec<(String, f64)>,
        boundaries: &'a Boundaries,
    ) -> Self {
        let (matched, missing) = boundaries.select(values);
        let regions = matched
            .into_iter()
            .map(|(name, value, feature)| MapRegion {
                name,
                value,
                feature,
            })
            .collect();
        if !missing.is_empty() {
            warn!("{}: no boundary for {}", title, missing.join(", "));
        }

        Self {
            title: title.to_string(),
            value_label: value_label.to_string(),
            scale,
            regions,
        }
    }

    fn from_table(
        title: &str,
        scale: ColorScale,
        table: &IndicatorTable,
        boundaries: &'a Boundaries,
        value: fn(&RegionIndicators) -> f64,
    ) -> Self {
        let values = table
            .regions
            .iter()
            .map(|r| (r.state.clone(), value(r)))
            .collect();
        Self::new(title, "%", scale, values, boundaries)
    }

    /// Adult mental disorder prevalence (DisorderPct).
    pub fn disorder(table: &IndicatorTable, boundaries: &'a Boundaries) -> Self {
        Self::from_table(
            "Mental Disorder Prevalence (18+) by State",
            ColorScale::OrRd,
            table,
            boundaries,
            |r| r.disorder_pct,
        )
    }

    /// Adult treatment received (TreatmentPct).
    pub fn treatment(table: &IndicatorTable, boundaries: &'a Boundaries) -> Self {
        Self::from_table(
            "Treatment Received (18+) by State",
            ColorScale::Blues,
            table,
            boundaries,
            |r| r.treatment_pct,
        )
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn features(&self) -> Vec<&'a BoundaryFeature> {
        self.regions.iter().map(|r| r.feature).collect()
    }

    /// Smallest and largest finite value on the map.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.regions
            .iter()
            .map(|r| r.value)
            .filter(|v| v.is_finite())
            .fold(None, |range, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Draw the map and its colorbar onto `root`.
    pub fn draw(&self, root: &Canvas<'_>, size: ImageSize) -> Result<(), RenderError> {
        if self.is_empty() {
            return Err(RenderError::Empty(format!("{}: no region has a boundary", self.title)));
        }
        let (min, max) = self.value_range().unwrap_or((0.0, 0.0));

        let root = root.titled(&self.title, font(size, 17.0))?;
        let (map_area, bar_area) =
            root.split_horizontally((root.dim_in_pixel().0 as f64 * MAP_WIDTH_FRACTION) as u32);
        let pad = size.px(10.0) as u32;
        let map_area = map_area.margin(pad, pad, pad, pad);

        let features = self.features();
        let projection = Equirectangular::fitted(&features);
        let (w, h) = map_area.dim_in_pixel();
        let bounds = projection
            .bounds(&features)
            .ok_or_else(|| RenderError::Empty(format!("{}: boundaries have no positions", self.title)))?
            .pad(0.02)
            .fit_aspect(w.max(1) as f64 / h.max(1) as f64);

        let mut chart = ChartBuilder::on(&map_area)
            .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)?;

        let outline = OUTLINE.stroke_width(size.px(0.5).max(1.0) as u32);
        for region in &self.regions {
            let fill = self.scale.color_for(region.value, min, max);
            for polygon in &region.feature.polygons {
                let mut rings = polygon.iter().map(|ring| projection.project_ring(ring));
                if let Some(exterior) = rings.next() {
                    chart.draw_series(std::iter::once(Polygon::new(exterior.clone(), fill.filled())))?;
                    chart.draw_series(std::iter::once(PathElement::new(exterior, outline)))?;
                }
                for hole in rings {
                    chart.draw_series(std::iter::once(Polygon::new(hole.clone(), WHITE.filled())))?;
                    chart.draw_series(std::iter::once(PathElement::new(hole, outline)))?;
                }
            }
        }

        self.draw_colorbar(&bar_area, size, min, max)
    }

    fn draw_colorbar(
        &self,
        area: &Canvas<'_>,
        size: ImageSize,
        min: f64,
        max: f64,
    ) -> Result<(), RenderError> {
        let (w, h) = area.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        let top = (h as f64 * 0.12) as i32;
        let bottom = h - top;
        let left = (size.px(6.0) as i32).min(w / 4);
        let right = left + (size.px(18.0) as i32).max(1);
        let span = (bottom - top).max(1);

        area.draw(&Text::new(
            self.value_label.clone(),
            (left, top - size.px(8.0) as i32),
            TextStyle::from(font(size, 12.0)).pos(Pos::new(HPos::Left, VPos::Bottom)),
        ))?;

        for step in 0..COLORBAR_STEPS {
            let y0 = top + span * step / COLORBAR_STEPS;
            let y1 = top + span * (step + 1) / COLORBAR_STEPS;
            let t = 1.0 - (step as f64 + 0.5) / COLORBAR_STEPS as f64;
            area.draw(&Rectangle::new([(left, y0), (right, y1)], self.scale.at(t).filled()))?;
        }
        area.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.mix(0.4)))?;

        let label_style = TextStyle::from(font(size, 10.0)).pos(Pos::new(HPos::Left, VPos::Center));
        for tick in 0..COLORBAR_TICKS {
            let t = tick as f64 / (COLORBAR_TICKS - 1) as f64;
            let y = bottom - (span as f64 * t) as i32;
            let value = min + (max - min) * t;
            area.draw(&PathElement::new(vec![(right, y), (right + size.px(3.0) as i32, y)], BLACK))?;
            area.draw(&Text::new(
                format!("{value:.1}"),
                (right + size.px(5.0) as i32, y),
                label_style.clone(),
            ))?;
        }
        Ok(())
    }
}
