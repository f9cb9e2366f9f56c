//! Planar projection of lon/lat boundaries for raster maps.

use crate::geo::{BoundaryFeature, Ring};

/// Axis-aligned bounds in projected units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, (x, y): (f64, f64)) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    fn is_valid(&self) -> bool {
        self.min_x.is_finite() && self.max_x.is_finite() && self.min_y.is_finite() && self.max_y.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow the shorter side so that width / height equals `aspect`,
    /// keeping the bounds centred.
    pub fn fit_aspect(&self, aspect: f64) -> Self {
        let (w, h) = (self.width().max(f64::EPSILON), self.height().max(f64::EPSILON));
        let mut fitted = *self;
        if w / h < aspect {
            let pad = (h * aspect - w) / 2.0;
            fitted.min_x -= pad;
            fitted.max_x += pad;
        } else {
            let pad = (w / aspect - h) / 2.0;
            fitted.min_y -= pad;
            fitted.max_y += pad;
        }
        fitted
    }

    /// Add a relative margin on every side.
    pub fn pad(&self, fraction: f64) -> Self {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        Self {
            min_x: self.min_x - dx,
            max_x: self.max_x + dx,
            min_y: self.min_y - dy,
            max_y: self.max_y + dy,
        }
    }
}

/// Equirectangular projection with a standard parallel.
///
/// Longitudes are scaled by the cosine of the reference latitude so shapes
/// near it keep their proportions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    cos_lat0: f64,
}

impl Equirectangular {
    pub fn new(reference_lat: f64) -> Self {
        Self {
            cos_lat0: reference_lat.to_radians().cos(),
        }
    }

    /// Projection centred on the latitude midpoint of the features.
    pub fn fitted(features: &[&BoundaryFeature]) -> Self {
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for &(_, lat) in features.iter().flat_map(|f| f.polygons.iter().flatten().flatten()) {
            lo = lo.min(lat);
            hi = hi.max(lat);
        }
        if lo.is_finite() {
            Self::new((lo + hi) / 2.0)
        } else {
            Self::new(0.0)
        }
    }

    pub fn project(&self, (lon, lat): (f64, f64)) -> (f64, f64) {
        (lon * self.cos_lat0, lat)
    }

    pub fn project_ring(&self, ring: &Ring) -> Vec<(f64, f64)> {
        ring.iter().map(|&p| self.project(p)).collect()
    }

    /// Projected bounds of the features, `None` when they have no positions.
    pub fn bounds(&self, features: &[&BoundaryFeature]) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        for &p in features.iter().flat_map(|f| f.polygons.iter().flatten().flatten()) {
            bounds.include(self.project(p));
        }
        bounds.is_valid().then_some(bounds)
    }
}
