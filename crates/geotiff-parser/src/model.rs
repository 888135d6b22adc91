//! Raster-to-model georeferencing.
//!
//! A GeoTIFF locates its pixel grid in model space either with a tiepoint
//! plus a pixel scale, or with a full 4x4 affine transformation.

use nalgebra::{Matrix4, Vector4};
use solar_common::BoundingBox;

use crate::error::DecodeError;

pub const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
pub const MODEL_TIEPOINT_TAG: u16 = 33922;
pub const MODEL_TRANSFORMATION_TAG: u16 = 34264;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelTransform {
    /// Raster point `(i, j)` maps to model point `(x, y)`; `scale` is the
    /// pixel size, with raster rows growing southward.
    Tiepoint {
        raster: (f64, f64),
        model: (f64, f64),
        scale: (f64, f64),
    },
    /// Row-major affine from `(i, j, k, 1)` to `(x, y, z, 1)`.
    Affine(Matrix4<f64>),
}

impl ModelTransform {
    /// Build from the raw tag values; the affine form wins when present.
    pub fn from_tags(
        tiepoint: Option<&[f64]>,
        scale: Option<&[f64]>,
        transformation: Option<&[f64]>,
    ) -> Result<Self, DecodeError> {
        if let Some(m) = transformation {
            if m.len() < 16 {
                return Err(DecodeError::InvalidGeoreference(format!(
                    "ModelTransformation has {} values, expected 16",
                    m.len()
                )));
            }
            return Ok(ModelTransform::Affine(Matrix4::from_row_slice(&m[..16])));
        }

        match (tiepoint, scale) {
            (Some(t), Some(s)) => {
                if t.len() < 6 || s.len() < 2 {
                    return Err(DecodeError::InvalidGeoreference(format!(
                        "tiepoint has {} values and scale {}, expected 6 and 3",
                        t.len(),
                        s.len()
                    )));
                }
                if s[0] == 0.0 || s[1] == 0.0 {
                    return Err(DecodeError::InvalidGeoreference("zero pixel scale".to_string()));
                }
                Ok(ModelTransform::Tiepoint {
                    raster: (t[0], t[1]),
                    model: (t[3], t[4]),
                    scale: (s[0], s[1]),
                })
            }
            _ => Err(DecodeError::MissingGeoreference),
        }
    }

    /// Model coordinates of raster position `(i, j)` (column, row).
    pub fn raster_to_model(&self, i: f64, j: f64) -> (f64, f64) {
        match self {
            ModelTransform::Tiepoint { raster, model, scale } => (
                model.0 + (i - raster.0) * scale.0,
                model.1 - (j - raster.1) * scale.1,
            ),
            ModelTransform::Affine(m) => {
                let p = m * Vector4::new(i, j, 0.0, 1.0);
                (p.x, p.y)
            }
        }
    }

    /// Model-space extent of a `width` x `height` raster.
    pub fn bounding_box(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [(0.0, 0.0), (0.0, h), (w, 0.0), (w, h)].map(|(i, j)| self.raster_to_model(i, j));
        // Four corners always yield a box.
        BoundingBox::enclosing(corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }
}
