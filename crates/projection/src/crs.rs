//! Resolving a GeoKey directory into a concrete coordinate reference system.

use solar_common::georef::keys;
use solar_common::GeoKeyDirectory;

use crate::ellipsoid::{Ellipsoid, USER_DEFINED};
use crate::error::ProjectionError;
use crate::transverse_mercator::TransverseMercator;
use crate::web_mercator;

const MODEL_PROJECTED: u16 = 1;
const MODEL_GEOGRAPHIC: u16 = 2;

/// `ProjCoordTransGeoKey` value for Transverse Mercator.
const CT_TRANSVERSE_MERCATOR: u16 = 1;

/// A coordinate reference system the reprojector knows how to invert.
#[derive(Debug, Clone, PartialEq)]
pub enum Crs {
    /// Geographic coordinates; `angular_factor` converts model units to degrees.
    Geographic { angular_factor: f64 },
    /// Transverse Mercator; `linear_factor` converts model units to metres.
    TransverseMercator {
        projection: TransverseMercator,
        linear_factor: f64,
    },
    WebMercator { linear_factor: f64 },
}

impl Crs {
    /// Resolve the CRS described by a GeoKey directory.
    pub fn from_geo_keys(dir: &GeoKeyDirectory) -> Result<Self, ProjectionError> {
        if dir.is_empty() {
            return Err(ProjectionError::MissingMetadata);
        }

        let model = match dir.short(keys::GT_MODEL_TYPE) {
            Some(model) => model,
            None if dir.short(keys::PROJECTED_CS_TYPE).is_some() => MODEL_PROJECTED,
            None if dir.short(keys::GEOGRAPHIC_TYPE).is_some() => MODEL_GEOGRAPHIC,
            None => return Err(ProjectionError::MissingKey(keys::GT_MODEL_TYPE)),
        };

        match model {
            MODEL_PROJECTED => Self::projected(dir),
            MODEL_GEOGRAPHIC => Self::geographic(dir),
            other => Err(ProjectionError::UnsupportedModelType(other)),
        }
    }

    fn geographic(dir: &GeoKeyDirectory) -> Result<Self, ProjectionError> {
        match dir.short(keys::GEOGRAPHIC_TYPE) {
            None | Some(USER_DEFINED) | Some(4326) | Some(4269) | Some(4258) => {}
            Some(code) => return Err(ProjectionError::UnsupportedCrs(code)),
        }
        let angular_factor = match dir.short(keys::GEOG_ANGULAR_UNITS) {
            Some(code) => angular_unit_factor(code)?,
            None => 1.0,
        };
        Ok(Crs::Geographic { angular_factor })
    }

    fn projected(dir: &GeoKeyDirectory) -> Result<Self, ProjectionError> {
        let linear_factor = match dir.short(keys::PROJ_LINEAR_UNITS) {
            Some(code) => linear_unit_factor(code)?,
            None => 1.0,
        };

        let code = dir
            .short(keys::PROJECTED_CS_TYPE)
            .ok_or(ProjectionError::MissingKey(keys::PROJECTED_CS_TYPE))?;

        let projection = match code {
            3857 | 3785 => return Ok(Crs::WebMercator { linear_factor }),
            32601..=32660 => TransverseMercator::utm((code - 32600) as u8, false, Ellipsoid::WGS84),
            32701..=32760 => TransverseMercator::utm((code - 32700) as u8, true, Ellipsoid::WGS84),
            26901..=26923 => TransverseMercator::utm((code - 26900) as u8, false, Ellipsoid::GRS80),
            25828..=25838 => TransverseMercator::utm((code - 25800) as u8, false, Ellipsoid::GRS80),
            USER_DEFINED => user_defined_transverse_mercator(dir)?,
            other => return Err(ProjectionError::UnsupportedCrs(other)),
        };

        Ok(Crs::TransverseMercator {
            projection,
            linear_factor,
        })
    }

    /// Convert a model-space point to `(lon, lat)` in degrees.
    pub fn to_lon_lat(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Crs::Geographic { angular_factor } => (x * angular_factor, y * angular_factor),
            Crs::TransverseMercator {
                projection,
                linear_factor,
            } => projection.inverse(x * linear_factor, y * linear_factor),
            Crs::WebMercator { linear_factor } => web_mercator::inverse(x * linear_factor, y * linear_factor),
        }
    }
}

fn user_defined_transverse_mercator(dir: &GeoKeyDirectory) -> Result<TransverseMercator, ProjectionError> {
    match dir.short(keys::PROJ_COORD_TRANS) {
        Some(CT_TRANSVERSE_MERCATOR) => {}
        Some(other) => return Err(ProjectionError::UnsupportedTransformation(other)),
        None => return Err(ProjectionError::MissingKey(keys::PROJ_COORD_TRANS)),
    }

    let ellipsoid = Ellipsoid::from_geo_keys(dir)?;
    let lon0 = dir
        .double(keys::PROJ_NAT_ORIGIN_LONG)
        .ok_or(ProjectionError::MissingKey(keys::PROJ_NAT_ORIGIN_LONG))?;
    let lat0 = dir.double(keys::PROJ_NAT_ORIGIN_LAT).unwrap_or(0.0);
    let k0 = dir.double(keys::PROJ_SCALE_AT_NAT_ORIGIN).unwrap_or(1.0);
    let false_easting = dir.double(keys::PROJ_FALSE_EASTING).unwrap_or(0.0);
    let false_northing = dir.double(keys::PROJ_FALSE_NORTHING).unwrap_or(0.0);

    Ok(TransverseMercator::new(ellipsoid, lon0, lat0, k0, false_easting, false_northing))
}

/// Metres per unit for an EPSG linear unit code.
pub fn linear_unit_factor(code: u16) -> Result<f64, ProjectionError> {
    match code {
        9001 => Ok(1.0),
        9002 => Ok(0.3048),
        9003 => Ok(1200.0 / 3937.0),
        9036 => Ok(1000.0),
        _ => Err(ProjectionError::UnsupportedUnit { kind: "linear", code }),
    }
}

/// Degrees per unit for an EPSG angular unit code.
pub fn angular_unit_factor(code: u16) -> Result<f64, ProjectionError> {
    match code {
        9101 => Ok(180.0 / std::f64::consts::PI),
        9102 => Ok(1.0),
        9103 => Ok(1.0 / 60.0),
        9104 => Ok(1.0 / 3600.0),
        9105 => Ok(0.9),
        _ => Err(ProjectionError::UnsupportedUnit { kind: "angular", code }),
    }
}
