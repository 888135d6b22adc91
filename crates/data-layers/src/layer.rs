//! Resolved data layers.

use std::sync::Arc;

use renderer::{NamedPalette, RenderFrame};
use serde::Serialize;
use solar_common::{GeoBounds, GeoRaster, LayerError, LayerId};

/// Palette plus the labels shown at either end of the legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub palette: NamedPalette,
    pub min_label: String,
    pub max_label: String,
}

impl Legend {
    pub fn new(palette: NamedPalette, min_label: impl Into<String>, max_label: impl Into<String>) -> Self {
        Self {
            palette,
            min_label: min_label.into(),
            max_label: max_label.into(),
        }
    }
}

/// The decoded rasters behind a layer, one variant per kind.
///
/// Every variant carries the roof mask; it is shared with sibling layers
/// of the same query.
#[derive(Debug, Clone)]
pub enum LayerSource {
    Mask {
        mask: Arc<GeoRaster>,
    },
    Dsm {
        mask: Arc<GeoRaster>,
        dsm: Arc<GeoRaster>,
        /// Observed elevation range
        min: f64,
        max: f64,
    },
    Rgb {
        mask: Arc<GeoRaster>,
        rgb: Arc<GeoRaster>,
    },
    AnnualFlux {
        mask: Arc<GeoRaster>,
        flux: Arc<GeoRaster>,
    },
    MonthlyFlux {
        mask: Arc<GeoRaster>,
        flux: Arc<GeoRaster>,
    },
    HourlyShade {
        mask: Arc<GeoRaster>,
        /// One raster per month, January first
        months: Vec<Arc<GeoRaster>>,
    },
}

impl LayerSource {
    pub fn mask(&self) -> &Arc<GeoRaster> {
        match self {
            LayerSource::Mask { mask }
            | LayerSource::Dsm { mask, .. }
            | LayerSource::Rgb { mask, .. }
            | LayerSource::AnnualFlux { mask, .. }
            | LayerSource::MonthlyFlux { mask, .. }
            | LayerSource::HourlyShade { mask, .. } => mask,
        }
    }
}

/// A layer ready to render.
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    /// Bounds of the roof mask; every frame is anchored here.
    pub bounds: GeoBounds,
    /// `None` for the aerial image.
    pub legend: Option<Legend>,
    pub source: LayerSource,
}

impl Layer {
    /// Number of frames every render of this layer produces.
    pub fn frame_count(&self) -> usize {
        self.id.frame_count()
    }

    /// Render every frame; see [`crate::render::render`].
    pub fn render(&self, show_roof_only: bool, month: usize, day: u32) -> Result<Vec<RenderFrame>, LayerError> {
        crate::render::render(self, show_roof_only, month, day)
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            id: self.id,
            title: self.id.title().to_string(),
            bounds: self.bounds,
            frame_count: self.frame_count(),
            legend: self.legend.as_ref().map(|legend| LegendSummary {
                colors: legend.palette.anchor_hex(),
                legend: legend.clone(),
            }),
        }
    }
}

/// Serializable description of a layer for whatever draws the overlay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: LayerId,
    pub title: String,
    pub bounds: GeoBounds,
    pub frame_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendSummary {
    #[serde(flatten)]
    pub legend: Legend,
    /// Anchor colors as `#rrggbb`
    pub colors: Vec<String>,
}
