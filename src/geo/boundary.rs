//! Boundary Geometry Module
//! Fetches the GeoJSON boundary dataset and matches features to regions.

use crate::config::BoundarySource;
use geojson::{Feature, FeatureCollection, JsonObject, PolygonType, Position};
use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Failed to download boundaries from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read boundaries from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// A closed ring of (longitude, latitude) positions.
pub type Ring = Vec<(f64, f64)>;

/// A polygon: exterior ring followed by any holes.
pub type Polygon = Vec<Ring>;

/// One named boundary feature.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub name: String,
    pub polygons: Vec<Polygon>,
    /// The feature as it appeared in the source document
    pub raw: Feature,
}

/// Boundary features keyed by `properties.name`.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    features: Vec<BoundaryFeature>,
    by_name: HashMap<String, usize>,
}

impl Boundaries {
    /// Load boundaries from the configured source.
    pub fn load(source: &BoundarySource) -> Result<Self, BoundaryError> {
        let text = match source {
            BoundarySource::Url(url) => {
                info!("Downloading boundaries from {}", url);
                let http = |source| BoundaryError::Http {
                    url: url.clone(),
                    source,
                };
                reqwest::blocking::get(url.as_str())
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .map_err(http)?
            }
            BoundarySource::File(path) => {
                info!("Reading boundaries from {}", path.display());
                fs::read_to_string(path).map_err(|source| BoundaryError::Io {
                    path: path.clone(),
                    source,
                })?
            }
        };
        Self::parse(&text)
    }

    /// Parse a GeoJSON `FeatureCollection`.
    ///
    /// Features without a name or with a geometry other than Polygon or
    /// MultiPolygon are skipped.
    pub fn parse(text: &str) -> Result<Self, BoundaryError> {
        let collection: FeatureCollection = text.parse()?;

        let mut boundaries = Self::default();
        for feature in collection {
            let Some(name) = feature.property("name").and_then(Value::as_str).map(str::to_string) else {
                warn!("Skipping boundary feature without properties.name");
                continue;
            };
            let polygons = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(geojson::Value::Polygon(polygon)) => vec![convert_polygon(polygon)?],
                Some(geojson::Value::MultiPolygon(polygons)) => {
                    polygons.iter().map(convert_polygon).collect::<Result<_, _>>()?
                }
                Some(_) => {
                    warn!("Skipping boundary feature {:?}: unsupported geometry", name);
                    continue;
                }
                None => {
                    warn!("Skipping boundary feature {:?} without geometry", name);
                    continue;
                }
            };
            boundaries.push(BoundaryFeature {
                name,
                polygons,
                raw: feature,
            });
        }

        info!("Parsed {} boundary features", boundaries.len());
        Ok(boundaries)
    }

    fn push(&mut self, feature: BoundaryFeature) {
        self.by_name
            .entry(feature.name.clone())
            .or_insert(self.features.len());
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Feature with exactly this name (case-sensitive).
    pub fn get(&self, name: &str) -> Option<&BoundaryFeature> {
        self.by_name.get(name).map(|&i| &self.features[i])
    }

    /// Pair each keyed item with its feature, in input order.
    ///
    /// Returns the matched items and the keys without a boundary.
    pub fn select<T>(&self, items: Vec<(String, T)>) -> (Vec<(String, T, &BoundaryFeature)>, Vec<String>) {
        let mut matched = Vec::with_capacity(items.len());
        let mut missing = Vec::new();
        for (name, item) in items {
            match self.get(&name) {
                Some(feature) => matched.push((name, item, feature)),
                None => missing.push(name),
            }
        }
        (matched, missing)
    }

    /// A `FeatureCollection` holding the given features.
    pub fn feature_collection(features: &[&BoundaryFeature]) -> Value {
        let collection = FeatureCollection {
            bbox: None,
            features: features.iter().map(|f| f.raw.clone()).collect(),
            foreign_members: None,
        };
        Value::Object(JsonObject::from(&collection))
    }
}

fn convert_position(position: &Position) -> Result<(f64, f64), BoundaryError> {
    match position.as_slice() {
        [lon, lat, ..] => Ok((*lon, *lat)),
        _ => Err(geojson::Error::PositionTooShort(position.len()).into()),
    }
}

fn convert_polygon(polygon: &PolygonType) -> Result<Polygon, BoundaryError> {
    polygon
        .iter()
        .map(|ring| ring.iter().map(convert_position).collect())
        .collect()
}
