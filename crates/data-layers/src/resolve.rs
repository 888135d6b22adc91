//! Turning a layer kind and a `dataLayers` response into a [`Layer`].

use std::sync::Arc;

use renderer::NamedPalette;
use solar_common::{DataLayersResponse, GeoRaster, LayerError, LayerId, RequestError};
use tracing::{info, instrument};

use crate::layer::{Layer, LayerSource, Legend};
use crate::loader::RasterLoader;

/// Fixed value range of the annual flux palette, kWh/kW/year.
pub const ANNUAL_FLUX_RANGE: (f64, f64) = (0.0, 1800.0);
/// Fixed value range of the monthly flux palette, kWh/kW/month.
pub const MONTHLY_FLUX_RANGE: (f64, f64) = (0.0, 200.0);

pub const MONTHS: usize = 12;
pub const HOURS: usize = 24;
pub const RGB_BANDS: usize = 3;

/// Where a resolution currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvePhase {
    Fetching { urls: Vec<String> },
    Decoding { rasters: usize },
}

/// Raster URLs a layer needs, mask first.
pub fn layer_urls(kind: LayerId, response: &DataLayersResponse) -> Vec<String> {
    let mut urls = vec![response.mask_url.clone()];
    match kind {
        LayerId::Mask => {}
        LayerId::Dsm => urls.push(response.dsm_url.clone()),
        LayerId::Rgb => urls.push(response.rgb_url.clone()),
        LayerId::AnnualFlux => urls.push(response.annual_flux_url.clone()),
        LayerId::MonthlyFlux => urls.push(response.monthly_flux_url.clone()),
        LayerId::HourlyShade => urls.extend(response.hourly_shade_urls.iter().cloned()),
    }
    urls
}

/// Resolve a layer without progress reporting.
pub async fn resolve(kind: LayerId, response: &DataLayersResponse, loader: &RasterLoader) -> Result<Layer, RequestError> {
    resolve_with_progress(kind, response, loader, |_| {}).await
}

/// Fetch and decode everything `kind` needs and assemble the layer.
///
/// All rasters (mask included) are fetched concurrently, then decoded
/// concurrently; the layer is built only once every one of them is ready.
#[instrument(skip(response, loader, progress), fields(layer = %kind))]
pub async fn resolve_with_progress<P>(
    kind: LayerId,
    response: &DataLayersResponse,
    loader: &RasterLoader,
    progress: P,
) -> Result<Layer, RequestError>
where
    P: Fn(ResolvePhase) + Send + Sync,
{
    if kind == LayerId::HourlyShade && response.hourly_shade_urls.len() != MONTHS {
        return Err(RequestError::new(
            "hourlyShadeUrls",
            LayerError::Format(format!(
                "expected {} hourly shade URLs, got {}",
                MONTHS,
                response.hourly_shade_urls.len()
            )),
        ));
    }

    let urls = layer_urls(kind, response);
    progress(ResolvePhase::Fetching { urls: urls.clone() });
    let count = urls.len();
    let mut rasters = loader
        .load_all(&urls, || progress(ResolvePhase::Decoding { rasters: count }))
        .await?
        .into_iter();

    // load_all returns one raster per URL, in order.
    let missing = || RequestError::new(urls[0].as_str(), LayerError::Format("raster missing from batch".to_string()));
    let mask = rasters.next().ok_or_else(missing)?;
    let data_url = urls.get(1).map(String::as_str).unwrap_or_default();

    let (source, legend) = match kind {
        LayerId::Mask => (
            LayerSource::Mask { mask: mask.clone() },
            Some(Legend::new(NamedPalette::Binary, "No roof", "Roof")),
        ),
        LayerId::Dsm => {
            let dsm = rasters.next().ok_or_else(missing)?;
            let (min, max) = elevation_range(&dsm).map_err(|e| RequestError::new(data_url, e))?;
            let legend = Legend::new(NamedPalette::Rainbow, format!("{:.1} m", min), format!("{:.1} m", max));
            (
                LayerSource::Dsm {
                    mask: mask.clone(),
                    dsm,
                    min,
                    max,
                },
                Some(legend),
            )
        }
        LayerId::Rgb => {
            let rgb = rasters.next().ok_or_else(missing)?;
            rgb.require_bands(RGB_BANDS).map_err(|e| RequestError::new(data_url, e))?;
            (LayerSource::Rgb { mask: mask.clone(), rgb }, None)
        }
        LayerId::AnnualFlux => {
            let flux = rasters.next().ok_or_else(missing)?;
            (
                LayerSource::AnnualFlux { mask: mask.clone(), flux },
                Some(Legend::new(NamedPalette::Iron, "Shady", "Sunny")),
            )
        }
        LayerId::MonthlyFlux => {
            let flux = rasters.next().ok_or_else(missing)?;
            flux.require_bands(MONTHS).map_err(|e| RequestError::new(data_url, e))?;
            (
                LayerSource::MonthlyFlux { mask: mask.clone(), flux },
                Some(Legend::new(NamedPalette::Iron, "Shady", "Sunny")),
            )
        }
        LayerId::HourlyShade => {
            let months: Vec<Arc<GeoRaster>> = rasters.collect();
            for (raster, url) in months.iter().zip(&urls[1..]) {
                raster.require_bands(HOURS).map_err(|e| RequestError::new(url.as_str(), e))?;
            }
            if months.len() != MONTHS {
                return Err(missing());
            }
            (
                LayerSource::HourlyShade { mask: mask.clone(), months },
                Some(Legend::new(NamedPalette::Sunlight, "Shade", "Sun")),
            )
        }
    };

    info!(bounds = ?mask.bounds(), frames = kind.frame_count(), "Layer resolved");
    Ok(Layer {
        id: kind,
        bounds: mask.bounds(),
        legend,
        source,
    })
}

/// Observed elevation range of a surface model, ignoring NaN.
fn elevation_range(dsm: &GeoRaster) -> Result<(f64, f64), LayerError> {
    dsm.band(0)
        .and_then(|band| band.min_max())
        .ok_or_else(|| LayerError::Format("surface model has no valid elevation samples".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::ImageryQuality;

    fn response() -> DataLayersResponse {
        DataLayersResponse {
            imagery_date: None,
            imagery_processed_date: None,
            dsm_url: "dsm".into(),
            rgb_url: "rgb".into(),
            mask_url: "mask".into(),
            annual_flux_url: "annual".into(),
            monthly_flux_url: "monthly".into(),
            hourly_shade_urls: (0..12).map(|m| format!("hourly{}", m)).collect(),
            imagery_quality: ImageryQuality::High,
        }
    }

    #[test]
    fn test_layer_urls_mask_first() {
        assert_eq!(layer_urls(LayerId::Mask, &response()), vec!["mask"]);
        assert_eq!(layer_urls(LayerId::Dsm, &response()), vec!["mask", "dsm"]);
        let hourly = layer_urls(LayerId::HourlyShade, &response());
        assert_eq!(hourly.len(), 13);
        assert_eq!(hourly[12], "hourly11");
    }
}
