//! Color ramps.
//!
//! Every layer palette goes through the same two steps: a 256-entry table
//! is interpolated from a handful of anchor colors, and a value is mapped
//! onto it by normalizing into [0, 1] and picking `table[round(n * 255)]`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Number of entries in a palette lookup table.
pub const PALETTE_SIZE: usize = 256;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `"#RRGGBB"` or `"RRGGBB"`.
    pub fn from_hex(hex: &str) -> Result<Self, RenderError> {
        hex_to_rgb(hex).ok_or_else(|| RenderError::InvalidColor(hex.to_string()))
    }

    /// Lowercase `"#rrggbb"`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_rgba(&self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some(Rgb::new(r, g, b))
}

/// A 256-entry color lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteTable {
    colors: [Rgb; PALETTE_SIZE],
}

impl PaletteTable {
    pub fn colors(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colors
    }

    pub fn get(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    /// Color for a normalized value; out-of-range input clamps to the ends.
    pub fn color_at(&self, n: f64) -> Rgb {
        self.colors[table_index(n)]
    }
}

/// Table index `round(n * 255)` for a normalized value.
pub fn table_index(n: f64) -> usize {
    if n.is_nan() {
        return 0;
    }
    (n.clamp(0.0, 1.0) * (PALETTE_SIZE - 1) as f64).round() as usize
}

/// Interpolate a lookup table from at least two anchor colors.
///
/// The index range is split into `anchors.len() - 1` equal segments and each
/// channel is interpolated linearly within a segment, so entry 0 is the
/// first anchor and entry 255 the last.
pub fn build_palette(anchors: &[Rgb]) -> Result<PaletteTable, RenderError> {
    if anchors.len() < 2 {
        return Err(RenderError::InvalidPalette(format!(
            "need at least 2 anchor colors, got {}",
            anchors.len()
        )));
    }

    let segments = anchors.len() - 1;
    let last = (PALETTE_SIZE - 1) as f64;
    let mut colors = [Rgb::default(); PALETTE_SIZE];
    for (i, color) in colors.iter_mut().enumerate() {
        // (i * segments) is an integer, so the last entry lands exactly on the last anchor
        let position = (i * segments) as f64 / last;
        let lower = (position.floor() as usize).min(segments);
        let upper = (position.ceil() as usize).min(segments);
        let t = position - lower as f64;
        let (a, b) = (anchors[lower], anchors[upper]);
        *color = Rgb::new(lerp(a.r, b.r, t), lerp(a.g, b.g, t), lerp(a.b, b.b, t));
    }

    Ok(PaletteTable { colors })
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let value = a as f64 + (b as f64 - a as f64) * t;
    value.round().clamp(0.0, 255.0) as u8
}

/// Map `value` into [0, 1] relative to `[min, max]`, clamping outside values.
///
/// A degenerate range (`max <= min`) maps everything at or below `min` to 0
/// and the rest to 1. NaN maps to 0.
pub fn normalize(value: f64, max: f64, min: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    if max <= min {
        return if value <= min { 0.0 } else { 1.0 };
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// The fixed anchor-color sets used by the data layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamedPalette {
    /// Roof mask: no roof to roof
    Binary,
    /// Elevation
    Rainbow,
    /// Solar flux
    Iron,
    /// Hourly shade: shade to sun
    Sunlight,
    /// Solar panel yearly energy
    Panels,
    Grayscale,
}

static BINARY_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Binary.build());
static RAINBOW_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Rainbow.build());
static IRON_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Iron.build());
static SUNLIGHT_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Sunlight.build());
static PANELS_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Panels.build());
static GRAYSCALE_TABLE: Lazy<PaletteTable> = Lazy::new(|| NamedPalette::Grayscale.build());

impl NamedPalette {
    pub const ALL: [NamedPalette; 6] = [
        NamedPalette::Binary,
        NamedPalette::Rainbow,
        NamedPalette::Iron,
        NamedPalette::Sunlight,
        NamedPalette::Panels,
        NamedPalette::Grayscale,
    ];

    pub fn anchors(&self) -> &'static [Rgb] {
        const BINARY: &[Rgb] = &[Rgb::new(0x21, 0x21, 0x21), Rgb::new(0xB3, 0xE5, 0xFC)];
        const RAINBOW: &[Rgb] = &[
            Rgb::new(0x39, 0x49, 0xAB),
            Rgb::new(0x81, 0xD4, 0xFA),
            Rgb::new(0x66, 0xBB, 0x6A),
            Rgb::new(0xFF, 0xE0, 0x82),
            Rgb::new(0xE5, 0x39, 0x35),
        ];
        const IRON: &[Rgb] = &[
            Rgb::new(0x00, 0x00, 0x0A),
            Rgb::new(0x91, 0x00, 0x9C),
            Rgb::new(0xE6, 0x46, 0x16),
            Rgb::new(0xFE, 0xB4, 0x00),
            Rgb::new(0xFF, 0xFF, 0xF6),
        ];
        const SUNLIGHT: &[Rgb] = &[Rgb::new(0x21, 0x21, 0x21), Rgb::new(0xFF, 0xCA, 0x28)];
        const PANELS: &[Rgb] = &[Rgb::new(0xE8, 0xEA, 0xF6), Rgb::new(0x1A, 0x23, 0x7E)];
        const GRAYSCALE: &[Rgb] = &[Rgb::new(0x00, 0x00, 0x00), Rgb::new(0xFF, 0xFF, 0xFF)];

        match self {
            NamedPalette::Binary => BINARY,
            NamedPalette::Rainbow => RAINBOW,
            NamedPalette::Iron => IRON,
            NamedPalette::Sunlight => SUNLIGHT,
            NamedPalette::Panels => PANELS,
            NamedPalette::Grayscale => GRAYSCALE,
        }
    }

    /// Anchors as lowercase hex strings, for legends.
    pub fn anchor_hex(&self) -> Vec<String> {
        self.anchors().iter().map(Rgb::to_hex).collect()
    }

    /// The shared lookup table, built on first use.
    pub fn table(&self) -> &'static PaletteTable {
        match self {
            NamedPalette::Binary => &*BINARY_TABLE,
            NamedPalette::Rainbow => &*RAINBOW_TABLE,
            NamedPalette::Iron => &*IRON_TABLE,
            NamedPalette::Sunlight => &*SUNLIGHT_TABLE,
            NamedPalette::Panels => &*PANELS_TABLE,
            NamedPalette::Grayscale => &*GRAYSCALE_TABLE,
        }
    }

    fn build(&self) -> PaletteTable {
        // Every named set has at least two anchors.
        build_palette(self.anchors()).unwrap_or(PaletteTable {
            colors: [Rgb::default(); PALETTE_SIZE],
        })
    }
}

/// Fill color for each solar panel from its yearly energy, normalized
/// between the least and most productive panel on the panel ramp.
pub fn panel_fill_colors(yearly_energy_kwh: &[f64]) -> Vec<String> {
    let (min, max) = yearly_energy_kwh
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let table = NamedPalette::Panels.table();
    yearly_energy_kwh
        .iter()
        .map(|&energy| table.color_at(normalize(energy, max, min)).to_hex())
        .collect()
}
