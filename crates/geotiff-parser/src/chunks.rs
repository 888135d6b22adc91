//! Strip and tile reassembly.
//!
//! Reads every chunk of the first image straight from the payload and
//! scatters its samples into one buffer per band, for pixel-interleaved and
//! separate-plane layouts alike and for any number of samples per pixel.

use std::io::{Read, Seek};

use solar_common::Band;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

use crate::error::DecodeError;

/// TIFF compression codes.
pub mod compression {
    pub const NONE: u16 = 1;
    pub const LZW: u16 = 5;
    pub const DEFLATE: u16 = 8;
    pub const ADOBE_DEFLATE: u16 = 32946;
}

/// TIFF predictor codes.
pub mod predictor {
    pub const NONE: u16 = 1;
    pub const HORIZONTAL: u16 = 2;
    pub const FLOATING_POINT: u16 = 3;
}

/// Storage type of every sample in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleKind {
    /// From SampleFormat and BitsPerSample. Format 4 (undefined) reads as unsigned.
    pub fn from_tags(format: u16, bits: u16) -> Result<Self, DecodeError> {
        let kind = match (format, bits) {
            (1 | 4, 8) => SampleKind::U8,
            (1 | 4, 16) => SampleKind::U16,
            (1 | 4, 32) => SampleKind::U32,
            (1 | 4, 64) => SampleKind::U64,
            (2, 8) => SampleKind::I8,
            (2, 16) => SampleKind::I16,
            (2, 32) => SampleKind::I32,
            (2, 64) => SampleKind::I64,
            (3, 32) => SampleKind::F32,
            (3, 64) => SampleKind::F64,
            _ => {
                return Err(DecodeError::Unsupported(format!(
                    "sample format {} with {} bits per sample",
                    format, bits
                )))
            }
        };
        Ok(kind)
    }

    fn is_float(self) -> bool {
        matches!(self, SampleKind::F32 | SampleKind::F64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunking {
    Strips { rows: usize },
    Tiles { width: usize, height: usize },
}

/// Where and how the pixel data of an image is stored.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub width: usize,
    pub height: usize,
    pub samples: usize,
    pub kind: SampleKind,
    /// PlanarConfiguration 2: one plane of chunks per band.
    pub planar: bool,
    pub compression: u16,
    pub predictor: u16,
    little_endian: bool,
    chunking: Chunking,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl ChunkLayout {
    /// Collect the layout tags of the decoder's current image.
    pub fn read<R: Read + Seek>(decoder: &mut Decoder<R>, data: &[u8]) -> Result<Self, DecodeError> {
        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);

        let samples = decoder.find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
        let bits = decoder
            .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
            .and_then(|v| v.first().copied())
            .unwrap_or(1);
        let format = decoder
            .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
            .and_then(|v| v.first().copied())
            .unwrap_or(1);
        let kind = SampleKind::from_tags(format, bits)?;

        let planar = match decoder.find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?.unwrap_or(1) {
            1 => false,
            2 => true,
            other => return Err(DecodeError::Unsupported(format!("planar configuration {}", other))),
        };
        let compression = decoder.find_tag_unsigned::<u16>(Tag::Compression)?.unwrap_or(compression::NONE);
        let predictor = decoder.find_tag_unsigned::<u16>(Tag::Predictor)?.unwrap_or(predictor::NONE);
        match predictor {
            predictor::NONE => {}
            predictor::HORIZONTAL if !kind.is_float() => {}
            predictor::FLOATING_POINT if kind.is_float() => {}
            other => {
                return Err(DecodeError::Unsupported(format!(
                    "predictor {} for {:?} samples",
                    other, kind
                )))
            }
        }

        let little_endian = match data.get(..2) {
            Some(b"II") => true,
            Some(b"MM") => false,
            _ => return Err(DecodeError::Tiff("missing byte order mark".to_string())),
        };

        let (chunking, offsets, byte_counts) = match decoder.find_tag_unsigned_vec::<u64>(Tag::TileOffsets)? {
            Some(offsets) => {
                let tile_width = decoder.get_tag_unsigned::<u32>(Tag::TileWidth)? as usize;
                let tile_height = decoder.get_tag_unsigned::<u32>(Tag::TileLength)? as usize;
                let counts = decoder.get_tag_u64_vec(Tag::TileByteCounts)?;
                let chunking = Chunking::Tiles {
                    width: tile_width,
                    height: tile_height,
                };
                (chunking, offsets, counts)
            }
            None => {
                let offsets = decoder.get_tag_u64_vec(Tag::StripOffsets)?;
                let counts = decoder.get_tag_u64_vec(Tag::StripByteCounts)?;
                let rows = decoder
                    .find_tag_unsigned::<u32>(Tag::RowsPerStrip)?
                    .map(|r| (r as usize).min(height))
                    .unwrap_or(height);
                (Chunking::Strips { rows }, offsets, counts)
            }
        };

        let layout = Self {
            width,
            height,
            samples,
            kind,
            planar,
            compression,
            predictor,
            little_endian,
            chunking,
            offsets,
            byte_counts,
        };
        layout.check_chunk_count()?;
        Ok(layout)
    }

    fn check_chunk_count(&self) -> Result<(), DecodeError> {
        let zero_sized = match self.chunking {
            Chunking::Strips { rows } => rows == 0,
            Chunking::Tiles { width, height } => width == 0 || height == 0,
        };
        if self.samples == 0 || zero_sized {
            return Err(DecodeError::Tiff("zero-sized chunk or sample count".to_string()));
        }
        let planes = if self.planar { self.samples } else { 1 };
        let expected = self.chunks_per_plane() * planes;
        if self.offsets.len() != expected || self.byte_counts.len() != expected {
            return Err(DecodeError::Tiff(format!(
                "{} chunk offsets and {} byte counts for {} chunks",
                self.offsets.len(),
                self.byte_counts.len(),
                expected
            )));
        }
        Ok(())
    }

    fn chunks_across(&self) -> usize {
        match self.chunking {
            Chunking::Strips { .. } => 1,
            Chunking::Tiles { width, .. } => self.width.div_ceil(width),
        }
    }

    fn chunks_per_plane(&self) -> usize {
        match self.chunking {
            Chunking::Strips { rows } => self.height.div_ceil(rows),
            Chunking::Tiles { height, .. } => self.chunks_across() * self.height.div_ceil(height),
        }
    }

    /// Top-left pixel, row stride in pixels and stored rows of chunk `index`
    /// within its plane. Tiles are padded to full size; the last strip is not.
    fn chunk_rect(&self, index: usize) -> (usize, usize, usize, usize) {
        match self.chunking {
            Chunking::Strips { rows } => {
                let y0 = index * rows;
                (0, y0, self.width, rows.min(self.height - y0))
            }
            Chunking::Tiles { width, height } => {
                let across = self.chunks_across();
                ((index % across) * width, (index / across) * height, width, height)
            }
        }
    }

    /// Decode every chunk into one band per sample.
    pub fn read_bands(&self, data: &[u8]) -> Result<Vec<Band>, DecodeError> {
        let bands = match self.kind {
            SampleKind::U8 => self.read_samples::<u8>(data)?.into_iter().map(Band::U8).collect(),
            SampleKind::U16 => self.read_samples::<u16>(data)?.into_iter().map(Band::U16).collect(),
            SampleKind::U32 => self.read_samples::<u32>(data)?.into_iter().map(Band::U32).collect(),
            SampleKind::U64 => self.read_samples::<u64>(data)?.into_iter().map(Band::U64).collect(),
            SampleKind::I8 => self.read_samples::<i8>(data)?.into_iter().map(Band::I8).collect(),
            SampleKind::I16 => self.read_samples::<i16>(data)?.into_iter().map(Band::I16).collect(),
            SampleKind::I32 => self.read_samples::<i32>(data)?.into_iter().map(Band::I32).collect(),
            SampleKind::I64 => self.read_samples::<i64>(data)?.into_iter().map(Band::I64).collect(),
            SampleKind::F32 => self.read_samples::<f32>(data)?.into_iter().map(Band::F32).collect(),
            SampleKind::F64 => self.read_samples::<f64>(data)?.into_iter().map(Band::F64).collect(),
        };
        Ok(bands)
    }

    fn read_samples<T: Sample>(&self, data: &[u8]) -> Result<Vec<Vec<T>>, DecodeError> {
        let pixels = self.width * self.height;
        let mut bands = vec![vec![T::default(); pixels]; self.samples];
        let per_pixel = if self.planar { 1 } else { self.samples };
        let per_plane = self.chunks_per_plane();

        for (index, (&offset, &count)) in self.offsets.iter().zip(&self.byte_counts).enumerate() {
            let plane = index / per_plane;
            let (x0, y0, stride, rows) = self.chunk_rect(index % per_plane);

            let raw = usize::try_from(offset)
                .ok()
                .zip(usize::try_from(count).ok())
                .and_then(|(start, len)| data.get(start..start.checked_add(len)?))
                .ok_or_else(|| DecodeError::Chunk {
                    index,
                    reason: format!("{} bytes at offset {} lie outside the payload", count, offset),
                })?;
            let mut bytes = self.decompress(raw, index)?;

            let needed = stride * rows * per_pixel * T::BYTES;
            if bytes.len() < needed {
                return Err(DecodeError::Chunk {
                    index,
                    reason: format!("decoded to {} bytes, expected {}", bytes.len(), needed),
                });
            }
            bytes.truncate(needed);
            let values = self.to_samples::<T>(bytes, stride * per_pixel, per_pixel);

            for row in 0..rows {
                let y = y0 + row;
                if y >= self.height {
                    break;
                }
                for col in 0..stride {
                    let x = x0 + col;
                    if x >= self.width {
                        break;
                    }
                    let src = (row * stride + col) * per_pixel;
                    let dst = y * self.width + x;
                    if self.planar {
                        bands[plane][dst] = values[src];
                    } else {
                        for (band, &value) in bands.iter_mut().zip(&values[src..src + per_pixel]) {
                            band[dst] = value;
                        }
                    }
                }
            }
        }
        Ok(bands)
    }

    fn decompress(&self, raw: &[u8], index: usize) -> Result<Vec<u8>, DecodeError> {
        let failed = |codec: &str, e: &dyn std::fmt::Display| DecodeError::Chunk {
            index,
            reason: format!("{}: {}", codec, e),
        };
        match self.compression {
            compression::NONE => Ok(raw.to_vec()),
            compression::DEFLATE | compression::ADOBE_DEFLATE => {
                let mut out = Vec::new();
                flate2::read::ZlibDecoder::new(raw)
                    .read_to_end(&mut out)
                    .map_err(|e| failed("deflate", &e))?;
                Ok(out)
            }
            compression::LZW => weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
                .decode(raw)
                .map_err(|e| failed("lzw", &e)),
            other => Err(DecodeError::Unsupported(format!("compression {}", other))),
        }
    }

    /// Bytes of one chunk to samples, undoing the predictor row by row.
    fn to_samples<T: Sample>(&self, mut bytes: Vec<u8>, row_len: usize, per_pixel: usize) -> Vec<T> {
        if self.predictor == predictor::FLOATING_POINT {
            let mut out = Vec::with_capacity(bytes.len() / T::BYTES);
            let mut sample = [0u8; 8];
            for row in bytes.chunks_exact_mut(row_len * T::BYTES) {
                undo_byte_differencing(row, per_pixel);
                // Byte planes, most significant first.
                for i in 0..row_len {
                    for (b, slot) in sample.iter_mut().take(T::BYTES).enumerate() {
                        *slot = row[b * row_len + i];
                    }
                    out.push(T::read(&sample, false));
                }
            }
            return out;
        }

        let mut values: Vec<T> = bytes
            .chunks_exact(T::BYTES)
            .map(|b| T::read(b, self.little_endian))
            .collect();
        if self.predictor == predictor::HORIZONTAL {
            for row in values.chunks_exact_mut(row_len) {
                for i in per_pixel..row.len() {
                    row[i] = row[i].accumulate(row[i - per_pixel]);
                }
            }
        }
        values
    }
}

fn undo_byte_differencing(row: &mut [u8], stride: usize) {
    for i in stride..row.len() {
        row[i] = row[i].wrapping_add(row[i - stride]);
    }
}

/// A fixed-width sample as stored in a chunk.
trait Sample: Copy + Default {
    const BYTES: usize;

    fn read(bytes: &[u8], little_endian: bool) -> Self;

    /// Add the previous sample back in after horizontal differencing.
    fn accumulate(self, previous: Self) -> Self;
}

macro_rules! sample {
    ($t:ty, $accumulate:expr) => {
        impl Sample for $t {
            const BYTES: usize = std::mem::size_of::<$t>();

            fn read(bytes: &[u8], little_endian: bool) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(&bytes[..Self::BYTES]);
                if little_endian {
                    <$t>::from_le_bytes(buf)
                } else {
                    <$t>::from_be_bytes(buf)
                }
            }

            fn accumulate(self, previous: Self) -> Self {
                $accumulate(self, previous)
            }
        }
    };
}

sample!(u8, u8::wrapping_add);
sample!(u16, u16::wrapping_add);
sample!(u32, u32::wrapping_add);
sample!(u64, u64::wrapping_add);
sample!(i8, i8::wrapping_add);
sample!(i16, i16::wrapping_add);
sample!(i32, i32::wrapping_add);
sample!(i64, i64::wrapping_add);
sample!(f32, |a: f32, b: f32| a + b);
sample!(f64, |a: f64, b: f64| a + b);

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_layout(width: usize, samples: usize, kind: SampleKind, compression: u16, predictor: u16) -> ChunkLayout {
        ChunkLayout {
            width,
            height: 1,
            samples,
            kind,
            planar: false,
            compression,
            predictor,
            little_endian: true,
            chunking: Chunking::Strips { rows: 1 },
            offsets: vec![0],
            byte_counts: vec![0],
        }
    }

    #[test]
    fn test_sample_kind_from_tags() {
        assert_eq!(SampleKind::from_tags(3, 32).unwrap(), SampleKind::F32);
        assert_eq!(SampleKind::from_tags(1, 32).unwrap(), SampleKind::U32);
        assert_eq!(SampleKind::from_tags(4, 8).unwrap(), SampleKind::U8);
        assert!(matches!(SampleKind::from_tags(3, 16), Err(DecodeError::Unsupported(_))));
        assert!(matches!(SampleKind::from_tags(1, 1), Err(DecodeError::Unsupported(_))));
    }

    #[test]
    fn test_horizontal_predictor_per_sample() {
        // Two samples per pixel, each channel differenced separately.
        let layout = strip_layout(3, 2, SampleKind::U16, compression::NONE, predictor::HORIZONTAL);
        let bytes: Vec<u8> = [10u16, 100, 1, 5, 1, 5].iter().flat_map(|v| v.to_le_bytes()).collect();
        let values: Vec<u16> = layout.to_samples(bytes, 6, 2);
        assert_eq!(values, vec![10, 100, 11, 105, 12, 110]);
    }

    #[test]
    fn test_floating_point_predictor() {
        // 1.0 = 3F800000, 2.0 = 40000000 as byte planes, then byte-differenced.
        let layout = strip_layout(2, 1, SampleKind::F32, compression::NONE, predictor::FLOATING_POINT);
        let encoded = vec![0x3F, 0x01, 0x40, 0x80, 0x00, 0x00, 0x00, 0x00];
        let values: Vec<f32> = layout.to_samples(encoded, 2, 1);
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_big_endian_samples() {
        let mut layout = strip_layout(2, 1, SampleKind::U16, compression::NONE, predictor::NONE);
        layout.little_endian = false;
        let values: Vec<u16> = layout.to_samples(vec![0x01, 0x02, 0x00, 0x07], 2, 1);
        assert_eq!(values, vec![0x0102, 7]);
    }

    #[test]
    fn test_lzw_chunk() {
        let layout = strip_layout(4, 1, SampleKind::U8, compression::LZW, predictor::NONE);
        let raw = [1u8, 2, 3, 4];
        let encoded = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .encode(&raw)
            .unwrap();
        assert_eq!(layout.decompress(&encoded, 0).unwrap(), raw);
    }

    #[test]
    fn test_unknown_compression_is_unsupported() {
        let layout = strip_layout(1, 1, SampleKind::U8, 7, predictor::NONE);
        assert!(matches!(layout.decompress(&[0], 0), Err(DecodeError::Unsupported(_))));
    }

    #[test]
    fn test_tile_grid() {
        let layout = ChunkLayout {
            width: 5,
            height: 3,
            chunking: Chunking::Tiles { width: 2, height: 2 },
            offsets: vec![0; 6],
            byte_counts: vec![0; 6],
            ..strip_layout(5, 1, SampleKind::U8, compression::NONE, predictor::NONE)
        };
        assert_eq!(layout.chunks_per_plane(), 6);
        assert_eq!(layout.chunk_rect(1), (2, 0, 2, 2));
        assert_eq!(layout.chunk_rect(3), (0, 2, 2, 2));
        assert_eq!(layout.chunk_rect(5), (4, 2, 2, 2));
        assert!(layout.check_chunk_count().is_ok());
    }
}
