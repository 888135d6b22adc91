use solar_common::bounds::BoundsError;
use solar_common::LayerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("No coordinate reference metadata (empty GeoKey directory)")]
    MissingMetadata,

    #[error("Unsupported model type {0}")]
    UnsupportedModelType(u16),

    #[error("Unsupported coordinate reference system EPSG:{0}")]
    UnsupportedCrs(u16),

    #[error("Unsupported coordinate transformation {0}")]
    UnsupportedTransformation(u16),

    #[error("Unsupported {kind} unit code {code}")]
    UnsupportedUnit { kind: &'static str, code: u16 },

    #[error("Missing GeoKey {0} for user-defined projection")]
    MissingKey(u16),

    #[error("Invalid ellipsoid: semi-major axis {semi_major}, inverse flattening {inv_flattening}")]
    InvalidEllipsoid { semi_major: f64, inv_flattening: f64 },

    #[error("Reprojected bounds are invalid: {0}")]
    InvalidBounds(#[from] BoundsError),
}

impl From<ProjectionError> for LayerError {
    fn from(err: ProjectionError) -> Self {
        LayerError::Projection(err.to_string())
    }
}
