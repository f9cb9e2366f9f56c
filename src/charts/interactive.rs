//! Interactive Chart Export
//! Builds plotly figures as JSON and wraps them in standalone HTML documents.

use crate::charts::bar::BarChart;
use crate::charts::choropleth::ChoroplethMap;
use crate::charts::palette::hex;
use crate::charts::raster::RenderError;
use crate::geo::Boundaries;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Plotly figure for a choropleth map.
pub fn choropleth_figure(map: &ChoroplethMap<'_>) -> Value {
    let locations: Vec<&str> = map.regions.iter().map(|r| r.name.as_str()).collect();
    let z: Vec<f64> = map.regions.iter().map(|r| r.value).collect();

    json!({
        "data": [{
            "type": "choropleth",
            "geojson": Boundaries::feature_collection(&map.features()),
            "featureidkey": "properties.name",
            "locations": locations,
            "z": z,
            "colorscale": map.scale.to_plotly(),
            "colorbar": {"title": {"text": map.value_label}},
            "marker": {"line": {"color": "white", "width": 0.5}},
            "hovertemplate": "%{location}: %{z:.2f}%<extra></extra>",
        }],
        "layout": {
            "title": {"text": map.title},
            "geo": {"fitbounds": "locations", "visible": false},
            "margin": {"l": 0, "r": 0, "t": 60, "b": 0},
        },
    })
}

/// Plotly figure for a bar chart.
///
/// Hover text carries the unsigned values, so downward bars still read as
/// positive percentages.
pub fn bar_figure(chart: &BarChart) -> Value {
    let mut layout = json!({
        "title": {"text": chart.title},
        "xaxis": {"title": {"text": "State"}, "showticklabels": chart.x_tick_labels},
        "yaxis": {"title": {"text": chart.y_label}, "range": [chart.y_range.0, chart.y_range.1]},
        "plot_bgcolor": "white",
    });
    if !chart.x_tick_labels {
        layout["annotations"] = chart
            .labels
            .iter()
            .map(|label| {
                json!({
                    "x": label,
                    "y": 0,
                    "text": label,
                    "showarrow": false,
                    "yanchor": "bottom",
                    "yshift": 4,
                })
            })
            .collect();
    }

    json!({
        "data": [{
            "type": "bar",
            "x": chart.labels,
            "y": chart.values,
            "marker": {"color": hex(chart.color)},
            "hovertext": chart.hover_texts(),
            "hovertemplate": "%{hovertext}<extra></extra>",
        }],
        "layout": layout,
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A self-contained HTML page rendering `figure` with plotly.js.
pub fn html_document(title: &str, figure: &Value) -> Result<String, RenderError> {
    // A literal "</" inside the inline script would end it early.
    let figure = serde_json::to_string(figure)?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
var figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
        title = escape_html(title),
    ))
}

/// Write `figure` as a standalone HTML page at `path`.
pub fn write_html(path: &Path, title: &str, figure: &Value) -> Result<(), RenderError> {
    fs::write(path, html_document(title, figure)?)?;
    Ok(())
}
