//! Bounding box types.
//!
//! [`BoundingBox`] is expressed in the raster's own model coordinates
//! (projected metres, feet or degrees). [`GeoBounds`] is the WGS84 rectangle
//! an overlay is anchored at.

use serde::{Deserialize, Serialize};

/// A bounding box in model (projected or geographic) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing all the given points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => BoundingBox::new(x, y, x, y),
                Some(b) => BoundingBox::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            })
        })
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// South-west corner as `(x, y)`.
    pub fn south_west(&self) -> (f64, f64) {
        (self.min_x, self.min_y)
    }

    /// North-east corner as `(x, y)`.
    pub fn north_east(&self) -> (f64, f64) {
        (self.max_x, self.max_y)
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A geodetic rectangle in WGS84 degrees.
///
/// Always satisfies `north > south` and `east > west` when built through
/// [`GeoBounds::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    /// Build bounds, checking orientation.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, BoundsError> {
        if !(north.is_finite() && south.is_finite() && east.is_finite() && west.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        if north <= south {
            return Err(BoundsError::Inverted {
                axis: "latitude",
                low: south,
                high: north,
            });
        }
        if east <= west {
            return Err(BoundsError::Inverted {
                axis: "longitude",
                low: west,
                high: east,
            });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Build bounds from south-west and north-east `(lon, lat)` corners.
    pub fn from_corners(sw: (f64, f64), ne: (f64, f64)) -> Result<Self, BoundsError> {
        Self::new(ne.1, sw.1, ne.0, sw.0)
    }

    /// Center point as `(lat, lng)`.
    pub fn center(&self) -> (f64, f64) {
        ((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }

    /// Check if a point lies within the bounds.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("bounds contain non-finite coordinates")]
    NonFinite,

    #[error("inverted {axis} range: {low} >= {high}")]
    Inverted {
        axis: &'static str,
        low: f64,
        high: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_box() {
        let bbox = BoundingBox::enclosing([(3.0, 4.0), (-1.0, 10.0), (2.0, -5.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-1.0, -5.0, 3.0, 10.0));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn test_geo_bounds_from_corners() {
        let bounds = GeoBounds::from_corners((-122.2, 37.4), (-122.1, 37.5)).unwrap();
        assert_eq!(bounds.north, 37.5);
        assert_eq!(bounds.south, 37.4);
        assert_eq!(bounds.east, -122.1);
        assert_eq!(bounds.west, -122.2);
        assert!(bounds.contains(37.45, -122.15));
        assert!(!bounds.contains(37.6, -122.15));
    }

    #[test]
    fn test_geo_bounds_rejects_inverted() {
        assert!(matches!(
            GeoBounds::new(10.0, 20.0, 5.0, 0.0),
            Err(BoundsError::Inverted { axis: "latitude", .. })
        ));
        assert!(matches!(
            GeoBounds::new(20.0, 10.0, 0.0, 0.0),
            Err(BoundsError::Inverted { axis: "longitude", .. })
        ));
        assert_eq!(GeoBounds::new(f64::NAN, 0.0, 1.0, 0.0), Err(BoundsError::NonFinite));
    }
}
