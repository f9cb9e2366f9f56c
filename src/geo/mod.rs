//! Geo module - boundary loading and map projection

mod boundary;
mod projection;

pub use boundary::{Boundaries, BoundaryError, BoundaryFeature, Polygon, Ring};
pub use projection::{Bounds, Equirectangular};
