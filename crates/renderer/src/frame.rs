//! Raster to RGBA frame rendering.
//!
//! A frame is either rendered at the data raster's own resolution or, when
//! a roof mask is supplied, at the mask's resolution with the data sampled
//! nearest-neighbour onto the mask grid. Non-roof pixels are transparent.

use image::RgbaImage;
use rayon::prelude::*;
use solar_common::{GeoBounds, GeoRaster};

use crate::error::RenderError;
use crate::palette::{normalize, PaletteTable, Rgb};

/// One rendered image, anchored at geodetic bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub image: RgbaImage,
    pub bounds: GeoBounds,
}

impl RenderFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGBA of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        crate::png::encode_png(&self.image)
    }
}

/// Value range a palette is stretched over.
#[derive(Debug, Clone, Copy)]
pub struct PaletteMapping<'a> {
    pub table: &'a PaletteTable,
    pub min: f64,
    pub max: f64,
}

impl PaletteMapping<'_> {
    pub fn color(&self, value: f64) -> Rgb {
        self.table.color_at(normalize(value, self.max, self.min))
    }
}

/// Render the first three bands as red, green and blue.
pub fn render_rgb(data: &GeoRaster, mask: Option<&GeoRaster>, bounds: GeoBounds) -> Result<RenderFrame, RenderError> {
    let available = data.band_count();
    let band = |i: usize| data.band(i).ok_or(RenderError::MissingBand { requested: i, available });
    let (r, g, b) = (band(0)?, band(1)?, band(2)?);

    render_with(data.width(), data.height(), mask, bounds, |idx| {
        let channel = |band: &solar_common::Band| band.value(idx).map_or(0, |v| v.clamp(0.0, 255.0) as u8);
        Rgb::new(channel(r), channel(g), channel(b))
    })
}

/// Render one band through a palette.
pub fn render_palette(
    data: &GeoRaster,
    band: usize,
    mask: Option<&GeoRaster>,
    mapping: PaletteMapping<'_>,
    bounds: GeoBounds,
) -> Result<RenderFrame, RenderError> {
    let values = data.band(band).ok_or(RenderError::MissingBand {
        requested: band,
        available: data.band_count(),
    })?;

    render_with(data.width(), data.height(), mask, bounds, |idx| {
        mapping.color(values.value(idx).unwrap_or(f64::NAN))
    })
}

/// Render through a palette with a caller-supplied per-pixel value.
///
/// `value` receives the row-major pixel index into a `width` x `height`
/// source grid.
pub fn render_palette_with<F>(
    width: usize,
    height: usize,
    mask: Option<&GeoRaster>,
    mapping: PaletteMapping<'_>,
    bounds: GeoBounds,
    value: F,
) -> Result<RenderFrame, RenderError>
where
    F: Fn(usize) -> f64 + Sync,
{
    render_with(width, height, mask, bounds, |idx| mapping.color(value(idx)))
}

/// Core loop: one color per source pixel, alpha from the mask.
fn render_with<F>(
    src_width: usize,
    src_height: usize,
    mask: Option<&GeoRaster>,
    bounds: GeoBounds,
    color: F,
) -> Result<RenderFrame, RenderError>
where
    F: Fn(usize) -> Rgb + Sync,
{
    if src_width == 0 || src_height == 0 {
        return Err(RenderError::EmptyImage {
            width: src_width,
            height: src_height,
        });
    }

    let (width, height) = match mask {
        Some(m) => (m.width(), m.height()),
        None => (src_width, src_height),
    };
    let dw = src_width as f64 / width as f64;
    let dh = src_height as f64 / height as f64;

    let mut buffer = vec![0u8; width * height * 4];
    buffer.par_chunks_mut(width * 4).enumerate().for_each(|(y, row)| {
        let src_row = ((y as f64 * dh).floor() as usize).min(src_height - 1);
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let src_col = ((x as f64 * dw).floor() as usize).min(src_width - 1);
            let alpha = match mask {
                Some(m) if !m.is_roof(y * width + x) => 0,
                _ => 255,
            };
            px.copy_from_slice(&color(src_row * src_width + src_col).to_rgba(alpha));
        }
    });

    let image = RgbaImage::from_raw(width as u32, height as u32, buffer).ok_or(RenderError::EmptyImage { width, height })?;
    Ok(RenderFrame { image, bounds })
}
