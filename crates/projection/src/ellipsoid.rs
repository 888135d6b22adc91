//! Reference ellipsoids.

use solar_common::georef::keys;
use solar_common::GeoKeyDirectory;

use crate::error::ProjectionError;

/// A reference ellipsoid given by its semi-major axis and flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres
    pub a: f64,
    /// Flattening
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        f: 1.0 / 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        f: 1.0 / 298.257_222_101,
    };

    pub const CLARKE_1866: Ellipsoid = Ellipsoid {
        a: 6_378_206.4,
        f: 1.0 / 294.978_698_213_9,
    };

    pub fn from_inverse_flattening(a: f64, inv_f: f64) -> Result<Self, ProjectionError> {
        if !(a.is_finite() && a > 0.0 && inv_f.is_finite() && inv_f > 1.0) {
            return Err(ProjectionError::InvalidEllipsoid {
                semi_major: a,
                inv_flattening: inv_f,
            });
        }
        Ok(Self { a, f: 1.0 / inv_f })
    }

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Second eccentricity squared.
    pub fn ep2(&self) -> f64 {
        let e2 = self.e2();
        e2 / (1.0 - e2)
    }

    /// Ellipsoid for an EPSG geographic CRS code.
    pub fn for_geographic_crs(code: u16) -> Option<Self> {
        match code {
            4326 => Some(Self::WGS84),
            4269 | 4258 => Some(Self::GRS80),
            4267 => Some(Self::CLARKE_1866),
            _ => None,
        }
    }

    /// Ellipsoid for an EPSG ellipsoid code.
    pub fn for_ellipsoid_code(code: u16) -> Option<Self> {
        match code {
            7030 => Some(Self::WGS84),
            7019 => Some(Self::GRS80),
            7008 => Some(Self::CLARKE_1866),
            _ => None,
        }
    }

    /// Work out the ellipsoid of a user-defined projected CRS.
    ///
    /// Looks at the geographic CRS code first, then the ellipsoid code,
    /// then explicit axis/flattening keys; WGS84 when none is given.
    pub fn from_geo_keys(dir: &GeoKeyDirectory) -> Result<Self, ProjectionError> {
        if let Some(code) = dir.short(keys::GEOGRAPHIC_TYPE).filter(|c| *c != USER_DEFINED) {
            return Self::for_geographic_crs(code).ok_or(ProjectionError::UnsupportedCrs(code));
        }
        if let Some(code) = dir.short(keys::GEOG_ELLIPSOID).filter(|c| *c != USER_DEFINED) {
            return Self::for_ellipsoid_code(code).ok_or(ProjectionError::UnsupportedCrs(code));
        }
        match (dir.double(keys::GEOG_SEMI_MAJOR_AXIS), dir.double(keys::GEOG_INV_FLATTENING)) {
            (Some(a), Some(inv_f)) => Self::from_inverse_flattening(a, inv_f),
            (Some(_), None) => Err(ProjectionError::MissingKey(keys::GEOG_INV_FLATTENING)),
            _ => Ok(Self::WGS84),
        }
    }
}

/// GeoTIFF marker for "user-defined" in any code-valued key.
pub const USER_DEFINED: u16 = 32767;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_eccentricity() {
        let e2 = Ellipsoid::WGS84.e2();
        assert!((e2 - 0.006_694_379_990_14).abs() < 1e-12);
    }

    #[test]
    fn test_user_defined_axes() {
        let dir = GeoKeyDirectory::new()
            .with_short(keys::GEOGRAPHIC_TYPE, USER_DEFINED)
            .with_double(keys::GEOG_SEMI_MAJOR_AXIS, 6_378_206.4)
            .with_double(keys::GEOG_INV_FLATTENING, 294.978_698_213_9);
        assert_eq!(Ellipsoid::from_geo_keys(&dir).unwrap(), Ellipsoid::CLARKE_1866);
    }

    #[test]
    fn test_rejects_degenerate_axes() {
        assert!(Ellipsoid::from_inverse_flattening(0.0, 298.0).is_err());
        assert!(Ellipsoid::from_inverse_flattening(6_378_137.0, f64::NAN).is_err());
    }

    #[test]
    fn test_defaults_to_wgs84() {
        assert_eq!(Ellipsoid::from_geo_keys(&GeoKeyDirectory::new()).unwrap(), Ellipsoid::WGS84);
    }
}
