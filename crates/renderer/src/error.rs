use solar_common::LayerError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Invalid palette: {0}")]
    InvalidPalette(String),

    #[error("Invalid hex color: {0:?}")]
    InvalidColor(String),

    #[error("Raster has {available} bands, band {requested} requested")]
    MissingBand { requested: usize, available: usize },

    #[error("Empty image: {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for LayerError {
    fn from(err: RenderError) -> Self {
        LayerError::Render(err.to_string())
    }
}
