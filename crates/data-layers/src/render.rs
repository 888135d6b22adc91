//! Layer to frame-sequence rendering.

use rayon::prelude::*;
use renderer::{render_palette, render_palette_with, render_rgb, NamedPalette, PaletteMapping, RenderFrame};
use solar_common::{GeoRaster, LayerError};
use tracing::debug;

use crate::layer::{Layer, LayerSource};
use crate::resolve::{ANNUAL_FLUX_RANGE, HOURS, MONTHLY_FLUX_RANGE, MONTHS};

/// Render every frame of `layer`.
///
/// Static kinds return one frame and ignore `month` and `day`. Monthly flux
/// returns 12 frames and hourly shade 24, one per hour of `day` in `month`;
/// picking the frame to show is left to [`crate::DisplayState`].
pub fn render(layer: &Layer, show_roof_only: bool, month: usize, day: u32) -> Result<Vec<RenderFrame>, LayerError> {
    let bounds = layer.bounds;

    let frames = match &layer.source {
        LayerSource::Mask { mask } => {
            let mapping = mapping(NamedPalette::Binary, (0.0, 1.0));
            vec![render_palette(mask, 0, roof_mask(mask, show_roof_only), mapping, bounds)?]
        }
        LayerSource::Dsm { mask, dsm, min, max } => {
            let mapping = mapping(NamedPalette::Rainbow, (*min, *max));
            vec![render_palette(dsm, 0, roof_mask(mask, show_roof_only), mapping, bounds)?]
        }
        LayerSource::Rgb { mask, rgb } => vec![render_rgb(rgb, roof_mask(mask, show_roof_only), bounds)?],
        LayerSource::AnnualFlux { mask, flux } => {
            let mapping = mapping(NamedPalette::Iron, ANNUAL_FLUX_RANGE);
            vec![render_palette(flux, 0, roof_mask(mask, show_roof_only), mapping, bounds)?]
        }
        LayerSource::MonthlyFlux { mask, flux } => {
            let mapping = mapping(NamedPalette::Iron, MONTHLY_FLUX_RANGE);
            (0..MONTHS)
                .into_par_iter()
                .map(|band| render_palette(flux, band, roof_mask(mask, show_roof_only), mapping, bounds))
                .collect::<Result<Vec<_>, _>>()?
        }
        LayerSource::HourlyShade { mask, months } => {
            check_date(month, day)?;
            let raster = months
                .get(month)
                .ok_or_else(|| LayerError::invalid_parameter("month", format!("no shade raster for month {}", month)))?;
            let mapping = mapping(NamedPalette::Sunlight, (0.0, 1.0));
            let bit = day - 1;
            let mask = roof_mask(mask, show_roof_only);
            (0..HOURS)
                .into_par_iter()
                .map(|hour| -> Result<RenderFrame, LayerError> {
                    let band = raster.band(hour).ok_or_else(|| {
                        LayerError::Format(format!("shade raster has {} bands, hour {} missing", raster.band_count(), hour))
                    })?;
                    let sun = |idx| if band.bit(idx, bit) == Some(true) { 1.0 } else { 0.0 };
                    Ok(render_palette_with(raster.width(), raster.height(), mask, mapping, bounds, sun)?)
                })
                .collect::<Result<Vec<_>, LayerError>>()?
        }
    };

    debug!(layer = %layer.id, frames = frames.len(), show_roof_only, "Rendered layer");
    Ok(frames)
}

fn roof_mask(mask: &GeoRaster, show_roof_only: bool) -> Option<&GeoRaster> {
    show_roof_only.then_some(mask)
}

fn mapping(palette: NamedPalette, (min, max): (f64, f64)) -> PaletteMapping<'static> {
    PaletteMapping {
        table: palette.table(),
        min,
        max,
    }
}

fn check_date(month: usize, day: u32) -> Result<(), LayerError> {
    if month >= MONTHS {
        return Err(LayerError::invalid_parameter("month", format!("{} is not in 0-11", month)));
    }
    if !(1..=31).contains(&day) {
        return Err(LayerError::invalid_parameter("day", format!("{} is not in 1-31", day)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_date() {
        assert!(check_date(0, 1).is_ok());
        assert!(check_date(11, 31).is_ok());
        assert!(check_date(12, 1).is_err());
        assert!(check_date(0, 0).is_err());
        assert!(check_date(0, 32).is_err());
    }
}
