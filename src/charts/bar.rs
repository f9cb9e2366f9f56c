//! Ranked bar charts of the male treatment rate.

use crate::charts::palette::{BAR_BLUE, GAP_RED};
use crate::charts::raster::{font, Canvas, RenderError};
use crate::config::ImageSize;
use crate::stats::{bottom_treatment_rate, top_treatment_rate, RegionIndicators};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// A bar chart with one bar per region.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub labels: Vec<String>,
    /// Plotted bar heights
    pub values: Vec<f64>,
    /// Values shown on hover; positive even when the bars point down
    pub hover_values: Vec<f64>,
    pub y_range: (f64, f64),
    pub color: RGBColor,
    /// Show region names under the x axis instead of at the zero baseline
    pub x_tick_labels: bool,
}

impl BarChart {
    /// Regions with the highest male treatment rate.
    pub fn top_treatment_rate(regions: &[RegionIndicators], n: usize) -> Self {
        let ranked = top_treatment_rate(regions, n);
        let values: Vec<f64> = ranked.iter().map(|r| r.male_treatment_rate).collect();
        Self {
            title: format!("Top {n} States by Male Treatment Rate (%)"),
            y_label: "Treatment Rate (%)".to_string(),
            labels: ranked.iter().map(|r| r.state.clone()).collect(),
            hover_values: values.clone(),
            values,
            y_range: (0.0, 100.0),
            color: BAR_BLUE,
            x_tick_labels: true,
        }
    }

    /// Regions with the lowest male treatment rate, drawn as downward bars of
    /// the untreated share.
    pub fn bottom_treatment_gap(regions: &[RegionIndicators], n: usize) -> Self {
        let ranked = bottom_treatment_rate(regions, n);
        let gaps: Vec<f64> = ranked.iter().map(|r| r.male_treatment_gap_pct()).collect();
        Self {
            title: format!("Bottom {n} States - Men not Receiving Treatment (%)"),
            y_label: "No Treatment (%)".to_string(),
            labels: ranked.iter().map(|r| r.state.clone()).collect(),
            values: gaps.iter().map(|g| -g).collect(),
            hover_values: gaps,
            y_range: (-100.0, 0.0),
            color: GAP_RED,
            x_tick_labels: false,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Hover text of each bar, e.g. `"Texas: 61.25%"`.
    pub fn hover_texts(&self) -> Vec<String> {
        self.labels
            .iter()
            .zip(&self.hover_values)
            .map(|(label, value)| format!("{label}: {value:.2}%"))
            .collect()
    }

    /// Draw the chart onto `root`.
    pub fn draw(&self, root: &Canvas<'_>, size: ImageSize) -> Result<(), RenderError> {
        let n = self.len().max(1) as u32;
        let labels = &self.labels;
        let tick_labels = self.x_tick_labels;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, font(size, 17.0))
            .margin(size.px(12.0) as u32)
            .x_label_area_size(size.px(if tick_labels { 70.0 } else { 12.0 }) as u32)
            .y_label_area_size(size.px(55.0) as u32)
            .build_cartesian_2d((0u32..n).into_segmented(), self.y_range.0..self.y_range.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.12))
            .light_line_style(TRANSPARENT)
            .x_labels(n as usize)
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) if tick_labels => {
                    labels.get(*i as usize).cloned().unwrap_or_default()
                }
                _ => String::new(),
            })
            .x_label_style(font(size, 10.0).transform(FontTransform::Rotate90))
            .y_label_style(font(size, 11.0))
            .y_desc(self.y_label.as_str())
            .x_desc("State")
            .axis_desc_style(font(size, 12.0))
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(self.color.filled())
                .margin(size.px(8.0) as u32)
                .data(self.values.iter().enumerate().map(|(i, v)| (i as u32, *v))),
        )?;

        if !tick_labels {
            let style = TextStyle::from(font(size, 10.0)).pos(Pos::new(HPos::Center, VPos::Top));
            chart.draw_series(labels.iter().enumerate().map(|(i, label)| {
                Text::new(
                    label.clone(),
                    (SegmentValue::CenterOf(i as u32), -1.0),
                    style.clone(),
                )
            }))?;
        }

        Ok(())
    }
}
