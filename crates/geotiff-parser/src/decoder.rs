//! Whole-payload GeoTIFF decoding.

use std::io::Cursor;

use solar_common::{Band, BoundingBox, GeoKeyDirectory};
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::chunks::ChunkLayout;
use crate::error::DecodeError;
use crate::geokeys::{parse_geo_keys, GEO_ASCII_PARAMS_TAG, GEO_DOUBLE_PARAMS_TAG, GEO_KEY_DIRECTORY_TAG};
use crate::model::{ModelTransform, MODEL_PIXEL_SCALE_TAG, MODEL_TIEPOINT_TAG, MODEL_TRANSFORMATION_TAG};

/// Everything extracted from a GeoTIFF payload, before reprojection.
#[derive(Debug, Clone)]
pub struct DecodedTiff {
    pub width: usize,
    pub height: usize,
    /// One entry per sample, row-major, sample type preserved.
    pub bands: Vec<Band>,
    /// Extent of the raster in model coordinates.
    pub model_bbox: BoundingBox,
    pub transform: ModelTransform,
    /// Empty when the file carries no GeoKey directory.
    pub geo_keys: GeoKeyDirectory,
}

/// Decode a complete GeoTIFF payload.
///
/// Only the first image is read. `tiff` supplies the tags; pixel data goes
/// through [`ChunkLayout`], which takes any number of samples per pixel.
pub fn decode(data: &[u8]) -> Result<DecodedTiff, DecodeError> {
    // Large flux rasters exceed the default tag buffer limits.
    let mut decoder = Decoder::new(Cursor::new(data))?.with_limits(Limits::unlimited());
    let layout = ChunkLayout::read(&mut decoder, data)?;
    let (width, height) = (layout.width, layout.height);

    let transform = {
        let tiepoint = find_f64_vec(&mut decoder, MODEL_TIEPOINT_TAG)?;
        let scale = find_f64_vec(&mut decoder, MODEL_PIXEL_SCALE_TAG)?;
        let matrix = find_f64_vec(&mut decoder, MODEL_TRANSFORMATION_TAG)?;
        ModelTransform::from_tags(tiepoint.as_deref(), scale.as_deref(), matrix.as_deref())?
    };
    let geo_keys = read_geo_keys(&mut decoder)?;

    let bands = layout.read_bands(data)?;

    debug!(
        width,
        height,
        bands = bands.len(),
        sample_type = ?layout.kind,
        planar = layout.planar,
        compression = layout.compression,
        geo_keys = geo_keys.len(),
        "Decoded GeoTIFF"
    );

    Ok(DecodedTiff {
        width,
        height,
        bands,
        model_bbox: transform.bounding_box(width, height),
        transform,
        geo_keys,
    })
}

fn find_f64_vec<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> Result<Option<Vec<f64>>, DecodeError> {
    match decoder.find_tag(Tag::from_u16_exhaustive(tag))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn read_geo_keys<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<GeoKeyDirectory, DecodeError> {
    let directory = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG))? {
        Some(value) => value.into_u16_vec()?,
        None => return Ok(GeoKeyDirectory::new()),
    };
    let doubles = find_f64_vec(decoder, GEO_DOUBLE_PARAMS_TAG)?.unwrap_or_default();
    let ascii = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS_TAG))? {
        Some(value) => value.into_string()?,
        None => String::new(),
    };
    parse_geo_keys(&directory, &doubles, &ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_tiff() {
        assert!(matches!(decode(b"not a tiff at all"), Err(DecodeError::Tiff(_))));
        assert!(decode(&[]).is_err());
    }
}
