//! Common types shared across the solar data-layer crates.

pub mod bounds;
pub mod error;
pub mod georef;
pub mod layer;
pub mod raster;
pub mod response;

pub use bounds::{BoundingBox, GeoBounds};
pub use error::{ErrorPayload, LayerError, LayerResult, RequestError};
pub use georef::{GeoKeyDirectory, GeoKeyValue};
pub use layer::LayerId;
pub use raster::{Band, GeoRaster, SampleType};
pub use response::{DataLayersRequest, DataLayersResponse, ImageryDate, ImageryQuality, LatLng};
