//! Synthetic raster generators.
//!
//! Patterns are simple enough that a test can compute the expected value of
//! any pixel by hand.

use crate::fixtures::{
    hourly_shade_id, ANNUAL_FLUX_ID, DSM_ID, MASK_ID, MONTHLY_FLUX_ID, RGB_ID, SITE_ORIGIN, SITE_PIXEL_SIZE, SITE_UTM_ZONE,
};
use crate::geotiff::GeoTiffBuilder;

/// Roof mask with a roof covering the centre half of the image in each
/// direction: 1 for `w/4 <= x < 3w/4` and `h/4 <= y < 3h/4`, else 0.
pub fn roof_mask(width: usize, height: usize) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let roof = (width / 4..3 * width / 4).contains(&x) && (height / 4..3 * height / 4).contains(&y);
            u8::from(roof)
        })
        .collect()
}

/// Values rising linearly from 0 at the first pixel to `max` at the last.
pub fn flux_ramp(width: usize, height: usize, max: f32) -> Vec<f32> {
    let n = width * height;
    let last = (n.max(2) - 1) as f32;
    (0..n).map(|i| max * i as f32 / last).collect()
}

/// Elevation in metres: `base + row * step`.
pub fn elevation_rows(width: usize, height: usize, base: f32, step: f32) -> Vec<f32> {
    (0..height)
        .flat_map(|y| std::iter::repeat(base + y as f32 * step).take(width))
        .collect()
}

/// Twelve monthly flux bands; every pixel of month `m` is `(m + 1) * 10`.
pub fn monthly_flux(width: usize, height: usize) -> Vec<Vec<f32>> {
    (0..12).map(|m| vec![(m + 1) as f32 * 10.0; width * height]).collect()
}

/// Twenty-four hourly shade bands. Hours 6 to 17 carry `day_bits` (bit
/// `d - 1` set means sun on day `d`), the night hours are all shade.
pub fn hourly_shade(width: usize, height: usize, day_bits: u32) -> Vec<Vec<u32>> {
    (0..24)
        .map(|hour| {
            let bits = if (6..18).contains(&hour) { day_bits } else { 0 };
            vec![bits; width * height]
        })
        .collect()
}

/// A builder pre-positioned on the fixture site.
pub fn site_builder(width: usize, height: usize) -> GeoTiffBuilder {
    GeoTiffBuilder::new(width as u32, height as u32)
        .origin(SITE_ORIGIN.0, SITE_ORIGIN.1)
        .pixel_size(SITE_PIXEL_SIZE, SITE_PIXEL_SIZE)
        .utm(SITE_UTM_ZONE, true)
}

/// GeoTIFF payloads for every raster of the fixture site, keyed by id.
///
/// All rasters share one grid except the RGB image, which is rendered at
/// twice the mask resolution like the real service does.
pub fn site_payloads(width: usize, height: usize) -> Vec<(String, Vec<u8>)> {
    let n = width * height;
    let mut payloads = vec![
        (MASK_ID.to_string(), site_builder(width, height).band_u8(roof_mask(width, height)).build()),
        (
            DSM_ID.to_string(),
            site_builder(width, height).band_f32(elevation_rows(width, height, 10.0, 0.5)).build(),
        ),
        (
            RGB_ID.to_string(),
            GeoTiffBuilder::new(2 * width as u32, 2 * height as u32)
                .origin(SITE_ORIGIN.0, SITE_ORIGIN.1)
                .pixel_size(SITE_PIXEL_SIZE / 2.0, SITE_PIXEL_SIZE / 2.0)
                .utm(SITE_UTM_ZONE, true)
                .band_u8(vec![200; 4 * n])
                .band_u8(vec![100; 4 * n])
                .band_u8(vec![50; 4 * n])
                .build(),
        ),
        (
            ANNUAL_FLUX_ID.to_string(),
            site_builder(width, height).band_f32(flux_ramp(width, height, 1500.0)).build(),
        ),
    ];

    let monthly = monthly_flux(width, height)
        .into_iter()
        .fold(site_builder(width, height), |b, band| b.band_f32(band));
    payloads.push((MONTHLY_FLUX_ID.to_string(), monthly.build()));

    for month in 0..12 {
        let shade = hourly_shade(width, height, 0b101)
            .into_iter()
            .fold(site_builder(width, height), |b, band| b.band_u32(band));
        payloads.push((hourly_shade_id(month), shade.build()));
    }
    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roof_mask_centre() {
        let mask = roof_mask(4, 4);
        assert_eq!(mask.iter().filter(|&&v| v == 1).count(), 4);
        assert_eq!(mask[5], 1);
        assert_eq!(mask[0], 0);
    }

    #[test]
    fn test_flux_ramp_ends() {
        let ramp = flux_ramp(3, 2, 1500.0);
        assert_eq!(ramp[0], 0.0);
        assert_eq!(ramp[5], 1500.0);
    }

    #[test]
    fn test_hourly_shade_night() {
        let bands = hourly_shade(1, 1, 0b101);
        assert_eq!(bands.len(), 24);
        assert_eq!(bands[0][0], 0);
        assert_eq!(bands[12][0], 0b101);
    }

    #[test]
    fn test_site_payloads_complete() {
        let payloads = site_payloads(4, 4);
        assert_eq!(payloads.len(), 17);
        assert!(payloads.iter().all(|(_, bytes)| bytes.starts_with(b"II*\0")));
    }
}
