//! Data-layer query and response types, as exchanged with the imagery service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// A point of interest in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Query handed to the transport: a center and a radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayersRequest {
    pub location: LatLng,
    pub radius_meters: f64,
}

impl DataLayersRequest {
    pub fn new(location: LatLng, radius_meters: f64) -> Result<Self, LayerError> {
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(LayerError::invalid_parameter(
                "location.latitude",
                format!("{} is outside [-90, 90]", location.latitude),
            ));
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(LayerError::invalid_parameter(
                "location.longitude",
                format!("{} is outside [-180, 180]", location.longitude),
            ));
        }
        if !(radius_meters.is_finite() && radius_meters > 0.0) {
            return Err(LayerError::invalid_parameter(
                "radiusMeters",
                format!("{} must be positive", radius_meters),
            ));
        }
        Ok(Self {
            location,
            radius_meters,
        })
    }
}

/// Quality of the imagery the service had available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageryQuality {
    High,
    Medium,
    Low,
}

/// Calendar date as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageryDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ImageryDate {
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// URLs of every raster available for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLayersResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagery_date: Option<ImageryDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imagery_processed_date: Option<ImageryDate>,
    pub dsm_url: String,
    pub rgb_url: String,
    pub mask_url: String,
    pub annual_flux_url: String,
    pub monthly_flux_url: String,
    pub hourly_shade_urls: Vec<String>,
    pub imagery_quality: ImageryQuality,
}

impl DataLayersResponse {
    pub fn from_json(json: &str) -> Result<Self, LayerError> {
        Ok(serde_json::from_str(json)?)
    }
}
