//! Tests for palette construction and value mapping.

use renderer::palette::{build_palette, hex_to_rgb, normalize, panel_fill_colors, NamedPalette, Rgb, PALETTE_SIZE};
use renderer::RenderError;

// ============================================================================
// build_palette
// ============================================================================

#[test]
fn test_every_named_palette_hits_its_end_anchors() {
    for palette in NamedPalette::ALL {
        let anchors = palette.anchors();
        let table = build_palette(anchors).unwrap();
        assert_eq!(table.colors().len(), PALETTE_SIZE);
        assert_eq!(table.get(0), anchors[0], "{:?}", palette);
        assert_eq!(table.get(255), anchors[anchors.len() - 1], "{:?}", palette);
        assert_eq!(&table, palette.table());
    }
}

#[test]
fn test_interior_anchors_are_hit() {
    // Five anchors put interior anchors at 63.75, 127.5 and 191.25, so the
    // nearest entries sit within one step of them.
    let table = NamedPalette::Rainbow.table();
    let green = hex_to_rgb("66BB6A").unwrap();
    let mid = table.get(127);
    assert!((mid.g as i32 - green.g as i32).abs() <= 2, "{:?}", mid);
}

#[test]
fn test_fewer_than_two_anchors_is_an_error() {
    assert!(matches!(build_palette(&[]), Err(RenderError::InvalidPalette(_))));
    assert!(matches!(
        build_palette(&[Rgb::new(1, 2, 3)]),
        Err(RenderError::InvalidPalette(_))
    ));
}

#[test]
fn test_channels_are_monotonic_between_two_anchors() {
    let table = NamedPalette::Sunlight.table();
    for pair in table.colors().windows(2) {
        assert!(pair[1].r >= pair[0].r);
        assert!(pair[1].g >= pair[0].g);
    }
}

// ============================================================================
// normalize / color_at
// ============================================================================

#[test]
fn test_normalize_endpoints_and_clamping() {
    assert_eq!(normalize(0.0, 1800.0, 0.0), 0.0);
    assert_eq!(normalize(1800.0, 1800.0, 0.0), 1.0);
    assert_eq!(normalize(-5.0, 1800.0, 0.0), 0.0);
    assert_eq!(normalize(5000.0, 1800.0, 0.0), 1.0);
    assert_eq!(normalize(900.0, 1800.0, 0.0), 0.5);
}

#[test]
fn test_annual_flux_midpoint_maps_to_entry_128() {
    let table = NamedPalette::Iron.table();
    assert_eq!(table.color_at(normalize(900.0, 1800.0, 0.0)), table.get(128));
}

// ============================================================================
// panel colors
// ============================================================================

#[test]
fn test_panel_fill_colors_span_the_ramp() {
    let colors = panel_fill_colors(&[400.0, 250.0, 325.0]);
    assert_eq!(colors[0], "#1a237e");
    assert_eq!(colors[1], "#e8eaf6");
    assert_eq!(colors[2], NamedPalette::Panels.table().get(128).to_hex());
}

#[test]
fn test_panel_fill_colors_single_panel() {
    assert_eq!(panel_fill_colors(&[300.0]), vec!["#e8eaf6".to_string()]);
    assert!(panel_fill_colors(&[]).is_empty());
}
