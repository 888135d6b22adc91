//! Error types for the data-layer pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::BoundsError;

/// Result type alias using LayerError.
pub type LayerResult<T> = Result<T, LayerError>;

/// Primary error type for raster acquisition and rendering.
#[derive(Debug, Clone, Error)]
pub enum LayerError {
    // === Data Errors ===
    #[error("Invalid GeoTIFF payload: {0}")]
    Format(String),

    #[error("Projection error: {0}")]
    Projection(String),

    // === Upstream Errors ===
    #[error("Upstream service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    // === Caller Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),
}

impl LayerError {
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        LayerError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn kind_code(&self) -> &'static str {
        match self {
            LayerError::Format(_) => "FormatError",
            LayerError::Projection(_) => "ProjectionError",
            LayerError::Upstream { .. } | LayerError::Transport(_) => "RequestError",
            LayerError::InvalidParameter { .. } => "InvalidParameter",
            LayerError::Render(_) => "RenderError",
        }
    }

    /// HTTP-style status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            LayerError::Upstream { status, .. } => *status,
            LayerError::InvalidParameter { .. } => 400,
            LayerError::Format(_) | LayerError::Projection(_) => 422,
            LayerError::Transport(_) => 502,
            LayerError::Render(_) => 500,
        }
    }
}

impl From<std::io::Error> for LayerError {
    fn from(err: std::io::Error) -> Self {
        LayerError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for LayerError {
    fn from(err: serde_json::Error) -> Self {
        LayerError::Format(format!("JSON error: {}", err))
    }
}

impl From<BoundsError> for LayerError {
    fn from(err: BoundsError) -> Self {
        LayerError::Projection(err.to_string())
    }
}

/// A failure while obtaining one raster, tagged with the URL it came from.
#[derive(Debug, Clone, Error)]
#[error("Request for {url} failed: {source}")]
pub struct RequestError {
    pub url: String,
    #[source]
    pub source: LayerError,
}

impl RequestError {
    pub fn new(url: impl Into<String>, source: impl Into<LayerError>) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Displayable form of this error for the UI.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            url: Some(self.url.clone()),
            kind: self.source.kind_code().to_string(),
            status: self.source.status_code(),
            message: self.source.to_string(),
        }
    }
}

/// Serializable error body exposed to whatever displays failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub kind: String,
    pub status: u16,
    pub message: String,
}

impl From<&LayerError> for ErrorPayload {
    fn from(err: &LayerError) -> Self {
        ErrorPayload {
            url: None,
            kind: err.kind_code().to_string(),
            status: err.status_code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_payload() {
        let err = RequestError::new(
            "https://example.com/geoTiff:get?id=abc",
            LayerError::Upstream {
                status: 403,
                body: "PERMISSION_DENIED".to_string(),
            },
        );
        let payload = err.payload();
        assert_eq!(payload.url.as_deref(), Some("https://example.com/geoTiff:get?id=abc"));
        assert_eq!(payload.kind, "RequestError");
        assert_eq!(payload.status, 403);
        assert!(payload.message.contains("PERMISSION_DENIED"));
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(LayerError::Format("x".into()).kind_code(), "FormatError");
        assert_eq!(LayerError::Projection("x".into()).kind_code(), "ProjectionError");
        assert_eq!(LayerError::invalid_parameter("day", "0").status_code(), 400);
    }
}
