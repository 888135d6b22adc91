//! Common test fixtures for the data-layers tests.
//!
//! A fictional site in UTM zone 10N at 0.5 m per pixel, with one
//! `geoTiff:get?id=...` URL per raster the imagery service would return.

use solar_common::{DataLayersResponse, ImageryQuality};

/// Upper-left corner of the site rasters, UTM 10N metres.
pub const SITE_ORIGIN: (f64, f64) = (576_000.0, 4_145_000.0);

/// Ground sample distance of the site rasters, metres.
pub const SITE_PIXEL_SIZE: f64 = 0.5;

pub const SITE_UTM_ZONE: u16 = 10;

/// Raster ids in the order the response lists them.
pub const MASK_ID: &str = "mask";
pub const DSM_ID: &str = "dsm";
pub const RGB_ID: &str = "rgb";
pub const ANNUAL_FLUX_ID: &str = "annualFlux";
pub const MONTHLY_FLUX_ID: &str = "monthlyFlux";

/// URL the fixture response uses for raster `id`.
pub fn site_url(id: &str) -> String {
    format!("https://solar.example.com/v1/geoTiff:get?id={}", id)
}

/// Id of the hourly shade raster for `month` (0 = January).
pub fn hourly_shade_id(month: usize) -> String {
    format!("hourlyShade{:02}", month)
}

/// A complete `dataLayers` response pointing at the fixture URLs.
pub fn data_layers_response() -> DataLayersResponse {
    DataLayersResponse {
        imagery_date: None,
        imagery_processed_date: None,
        dsm_url: site_url(DSM_ID),
        rgb_url: site_url(RGB_ID),
        mask_url: site_url(MASK_ID),
        annual_flux_url: site_url(ANNUAL_FLUX_ID),
        monthly_flux_url: site_url(MONTHLY_FLUX_ID),
        hourly_shade_urls: (0..12).map(|m| site_url(&hourly_shade_id(m))).collect(),
        imagery_quality: ImageryQuality::High,
    }
}

/// The same response as the API would send it.
pub const DATA_LAYERS_JSON: &str = r#"{
    "imageryDate": {"year": 2022, "month": 4, "day": 6},
    "imageryProcessedDate": {"year": 2023, "month": 8, "day": 4},
    "dsmUrl": "https://solar.example.com/v1/geoTiff:get?id=dsm",
    "rgbUrl": "https://solar.example.com/v1/geoTiff:get?id=rgb",
    "maskUrl": "https://solar.example.com/v1/geoTiff:get?id=mask",
    "annualFluxUrl": "https://solar.example.com/v1/geoTiff:get?id=annualFlux",
    "monthlyFluxUrl": "https://solar.example.com/v1/geoTiff:get?id=monthlyFlux",
    "hourlyShadeUrls": [
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade00",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade01",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade02",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade03",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade04",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade05",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade06",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade07",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade08",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade09",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade10",
        "https://solar.example.com/v1/geoTiff:get?id=hourlyShade11"
    ],
    "imageryQuality": "HIGH"
}"#;
