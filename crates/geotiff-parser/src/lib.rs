//! GeoTIFF decoder for data-layer rasters.
//!
//! Turns the raw bytes of a GeoTIFF payload into a typed multi-band pixel
//! grid, the model-space bounding box and the GeoKey directory. No
//! resampling or reprojection happens here; see the `projection` crate for
//! turning the bounding box into geodetic bounds.

pub mod chunks;
pub mod decoder;
pub mod error;
pub mod geokeys;
pub mod model;

pub use chunks::{ChunkLayout, SampleKind};
pub use decoder::{decode, DecodedTiff};
pub use error::DecodeError;
pub use geokeys::parse_geo_keys;
pub use model::ModelTransform;
