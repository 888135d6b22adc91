//! Coordinate reference system transformations.
//!
//! Converts a raster's model-space bounding box into WGS84 geodetic bounds
//! using the CRS described by its GeoKeys. The projections are implemented
//! from scratch without external dependencies.

pub mod crs;
pub mod ellipsoid;
pub mod error;
pub mod transverse_mercator;
pub mod web_mercator;

pub use crs::Crs;
pub use ellipsoid::Ellipsoid;
pub use error::ProjectionError;
pub use transverse_mercator::TransverseMercator;

use solar_common::{BoundingBox, GeoBounds, GeoKeyDirectory};
use tracing::trace;

/// Reproject a model-space bounding box to north/south/east/west degrees.
///
/// Only the south-west and north-east corners are transformed; the
/// rasters served for a single building are small enough that edge
/// curvature is negligible.
pub fn to_geodetic_bounds(bbox: &BoundingBox, geo_keys: &GeoKeyDirectory) -> Result<GeoBounds, ProjectionError> {
    let crs = Crs::from_geo_keys(geo_keys)?;
    let (sw_x, sw_y) = bbox.south_west();
    let (ne_x, ne_y) = bbox.north_east();
    let sw = crs.to_lon_lat(sw_x, sw_y);
    let ne = crs.to_lon_lat(ne_x, ne_y);
    trace!(?crs, ?sw, ?ne, "Reprojected bounding box corners");
    Ok(GeoBounds::from_corners(sw, ne)?)
}
