//! Tests for RGB and palette frame rendering.

use renderer::{render_palette, render_palette_with, render_rgb, NamedPalette, PaletteMapping, RenderError};
use solar_common::{Band, GeoBounds, GeoRaster};

fn bounds() -> GeoBounds {
    GeoBounds::new(37.43, 37.42, -122.07, -122.08).unwrap()
}

fn raster(width: usize, height: usize, bands: Vec<Band>) -> GeoRaster {
    GeoRaster::new(width, height, bands, bounds()).unwrap()
}

fn iron(min: f64, max: f64) -> PaletteMapping<'static> {
    PaletteMapping {
        table: NamedPalette::Iron.table(),
        min,
        max,
    }
}

#[test]
fn test_palette_frame_at_data_resolution() {
    let data = raster(2, 1, vec![Band::F32(vec![0.0, 100.0])]);
    let frame = render_palette(&data, 0, None, iron(0.0, 100.0), bounds()).unwrap();

    assert_eq!((frame.width(), frame.height()), (2, 1));
    assert_eq!(frame.pixel(0, 0), [0x00, 0x00, 0x0A, 255]);
    assert_eq!(frame.pixel(1, 0), [0xFF, 0xFF, 0xF6, 255]);
    assert_eq!(frame.bounds, bounds());
}

#[test]
fn test_mask_controls_size_and_alpha() {
    // 1x1 data stretched over a 2x2 mask with one roof pixel.
    let data = raster(1, 1, vec![Band::F32(vec![50.0])]);
    let mask = raster(2, 2, vec![Band::U8(vec![0, 1, 0, 0])]);
    let frame = render_palette(&data, 0, Some(&mask), iron(0.0, 100.0), bounds()).unwrap();

    assert_eq!((frame.width(), frame.height()), (2, 2));
    assert_eq!(frame.pixel(0, 0)[3], 0);
    assert_eq!(frame.pixel(1, 0)[3], 255);
    assert_eq!(frame.pixel(1, 0), NamedPalette::Iron.table().color_at(0.5).to_rgba(255));
}

#[test]
fn test_nearest_neighbour_downsampling() {
    // 4x1 data onto a 2x1 mask picks columns 0 and 2.
    let data = raster(4, 1, vec![Band::F32(vec![0.0, 10.0, 100.0, 10.0])]);
    let mask = raster(2, 1, vec![Band::U8(vec![1, 1])]);
    let frame = render_palette(&data, 0, Some(&mask), iron(0.0, 100.0), bounds()).unwrap();

    assert_eq!(frame.pixel(0, 0), NamedPalette::Iron.table().get(0).to_rgba(255));
    assert_eq!(frame.pixel(1, 0), NamedPalette::Iron.table().get(255).to_rgba(255));
}

#[test]
fn test_rgb_frame() {
    let data = raster(
        1,
        1,
        vec![Band::U8(vec![10]), Band::U8(vec![20]), Band::U8(vec![30])],
    );
    let frame = render_rgb(&data, None, bounds()).unwrap();
    assert_eq!(frame.pixel(0, 0), [10, 20, 30, 255]);
}

#[test]
fn test_rgb_needs_three_bands() {
    let data = raster(1, 1, vec![Band::U8(vec![10]), Band::U8(vec![20])]);
    let err = render_rgb(&data, None, bounds()).unwrap_err();
    assert_eq!(err, RenderError::MissingBand { requested: 2, available: 2 });
}

#[test]
fn test_rgb_reports_first_missing_band() {
    let data = raster(1, 1, vec![Band::U8(vec![10])]);
    let err = render_rgb(&data, None, bounds()).unwrap_err();
    assert_eq!(err, RenderError::MissingBand { requested: 1, available: 1 });
}

#[test]
fn test_missing_band_index() {
    let data = raster(1, 1, vec![Band::F32(vec![1.0])]);
    let err = render_palette(&data, 3, None, iron(0.0, 1.0), bounds()).unwrap_err();
    assert_eq!(err, RenderError::MissingBand { requested: 3, available: 1 });
}

#[test]
fn test_nan_renders_first_entry() {
    let data = raster(1, 1, vec![Band::F32(vec![f32::NAN])]);
    let frame = render_palette(&data, 0, None, iron(0.0, 1.0), bounds()).unwrap();
    assert_eq!(frame.pixel(0, 0), NamedPalette::Iron.table().get(0).to_rgba(255));
}

#[test]
fn test_custom_value_function() {
    let mapping = PaletteMapping {
        table: NamedPalette::Sunlight.table(),
        min: 0.0,
        max: 1.0,
    };
    let frame = render_palette_with(3, 1, None, mapping, bounds(), |idx| (idx % 2) as f64).unwrap();
    assert_eq!(frame.pixel(0, 0), [0x21, 0x21, 0x21, 255]);
    assert_eq!(frame.pixel(1, 0), [0xFF, 0xCA, 0x28, 255]);
}

#[test]
fn test_frames_encode_to_png() {
    let data = raster(2, 2, vec![Band::F32(vec![0.0, 1.0, 2.0, 3.0])]);
    let frame = render_palette(&data, 0, None, iron(0.0, 3.0), bounds()).unwrap();
    let png = frame.to_png().unwrap();
    assert_eq!(&png[1..4], b"PNG");
}
