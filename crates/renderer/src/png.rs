//! PNG encoding for rendered frames.
//!
//! Palette-rendered layers rarely use more than 256 distinct RGBA values
//! (256 table entries plus transparent), so frames are written as indexed
//! PNG (color type 3) whenever they fit and as RGBA (color type 6) otherwise.

use std::collections::HashMap;
use std::io::Write;

use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use crate::error::RenderError;

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Rows per parallel indexing chunk
const ROWS_PER_CHUNK: usize = 64;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Encode a frame, choosing indexed or RGBA output automatically.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyImage { width, height });
    }

    match index_colors(image) {
        Some((palette, indices)) => {
            debug!(width, height, colors = palette.len(), "Encoding indexed PNG");
            encode_indexed(width, height, &palette, &indices)
        }
        None => {
            debug!(width, height, "Encoding RGBA PNG");
            encode_rgba(width, height, image.as_raw())
        }
    }
}

/// Build a palette and per-pixel indices, or `None` past 256 colors.
fn index_colors(image: &RgbaImage) -> Option<(Vec<[u8; 4]>, Vec<u8>)> {
    let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Vec<[u8; 4]> = Vec::with_capacity(MAX_PALETTE_SIZE);
    for px in image.pixels() {
        if !lookup.contains_key(&px.0) {
            if palette.len() == MAX_PALETTE_SIZE {
                return None;
            }
            lookup.insert(px.0, palette.len() as u8);
            palette.push(px.0);
        }
    }

    let raw = image.as_raw();
    let mut indices = vec![0u8; raw.len() / 4];
    let chunk = image.width() as usize * ROWS_PER_CHUNK;
    indices.par_chunks_mut(chunk).enumerate().for_each(|(i, out)| {
        let start = i * chunk * 4;
        for (idx, px) in out.iter_mut().zip(raw[start..].chunks_exact(4)) {
            *idx = lookup.get(px).copied().unwrap_or(0);
        }
    });

    Some((palette, indices))
}

fn encode_indexed(width: usize, height: usize, palette: &[[u8; 4]], indices: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    // Alpha per palette entry, only when something is see-through.
    if palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    write_chunk(&mut png, b"IDAT", &deflate_scanlines(indices, width)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn encode_rgba(width: usize, height: usize, pixels: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut png = SIGNATURE.to_vec();
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    write_chunk(&mut png, b"IDAT", &deflate_scanlines(pixels, width * 4)?);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    // bit depth, color type, compression, filter, interlace
    data.extend_from_slice(&[8, color_type, 0, 0, 0]);
    data
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> Result<Vec<u8>, RenderError> {
    let mut raw = Vec::with_capacity(data.len() + data.len() / row_bytes);
    for row in data.chunks_exact(row_bytes) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&raw).map_err(|e| RenderError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| RenderError::Encode(e.to_string()))
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_index_colors_dedupes() {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 1, Rgba([255, 0, 0, 255]));

        let (palette, indices) = index_colors(&image).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(indices[0], indices[3]);
        assert_eq!(indices[1], indices[2]);
    }

    #[test]
    fn test_too_many_colors() {
        let image = RgbaImage::from_fn(300, 1, |x, _| Rgba([(x % 256) as u8, (x / 256) as u8, 0, 255]));
        assert!(index_colors(&image).is_none());
    }

    #[test]
    fn test_transparent_frame_gets_trns() {
        let image = RgbaImage::new(3, 3);
        let png = encode_png(&image).unwrap();
        assert!(png.windows(4).any(|w| w == b"tRNS"));
    }
}
