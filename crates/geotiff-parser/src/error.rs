use solar_common::LayerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Unsupported layout: {0}")]
    Unsupported(String),

    #[error("No georeferencing: expected ModelTiepoint + ModelPixelScale or ModelTransformation")]
    MissingGeoreference,

    #[error("Invalid georeferencing tag: {0}")]
    InvalidGeoreference(String),

    #[error("Malformed GeoKey directory: {0}")]
    MalformedGeoKeys(String),

    #[error("Chunk {index}: {reason}")]
    Chunk { index: usize, reason: String },
}

impl From<tiff::TiffError> for DecodeError {
    fn from(err: tiff::TiffError) -> Self {
        DecodeError::Tiff(err.to_string())
    }
}

impl From<DecodeError> for LayerError {
    fn from(err: DecodeError) -> Self {
        LayerError::Format(err.to_string())
    }
}
