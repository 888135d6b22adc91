//! Image rendering for solar data layers.
//!
//! Implements the rendering primitives the layer renderer dispatches to:
//! - Palette construction and value-to-color mapping
//! - RGB and palette frames, optionally masked to the roof
//! - PNG encoding (indexed or RGBA)

pub mod error;
pub mod frame;
pub mod palette;
pub mod png;

pub use error::RenderError;
pub use frame::{render_palette, render_palette_with, render_rgb, PaletteMapping, RenderFrame};
pub use palette::{build_palette, normalize, panel_fill_colors, NamedPalette, PaletteTable, Rgb};
