//! Decoded raster types.

use num_traits::ToPrimitive;

use crate::bounds::GeoBounds;
use crate::error::LayerError;

/// Sample type of a band, as stored in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
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

impl SampleType {
    pub fn is_integer(&self) -> bool {
        !matches!(self, SampleType::F32 | SampleType::F64)
    }
}

/// One scalar channel of a raster in row-major order, sample type preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum Band {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! with_samples {
    ($band:expr, $v:ident => $body:expr) => {
        match $band {
            Band::U8($v) => $body,
            Band::U16($v) => $body,
            Band::U32($v) => $body,
            Band::U64($v) => $body,
            Band::I8($v) => $body,
            Band::I16($v) => $body,
            Band::I32($v) => $body,
            Band::I64($v) => $body,
            Band::F32($v) => $body,
            Band::F64($v) => $body,
        }
    };
}

/// Integer interpretation of a sample, used for bit-packed bands.
fn sample_bits<T: ToPrimitive>(v: &T) -> Option<u64> {
    v.to_i64().map(|i| i as u64).or_else(|| v.to_u64())
}

impl Band {
    pub fn len(&self) -> usize {
        with_samples!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_type(&self) -> SampleType {
        match self {
            Band::U8(_) => SampleType::U8,
            Band::U16(_) => SampleType::U16,
            Band::U32(_) => SampleType::U32,
            Band::U64(_) => SampleType::U64,
            Band::I8(_) => SampleType::I8,
            Band::I16(_) => SampleType::I16,
            Band::I32(_) => SampleType::I32,
            Band::I64(_) => SampleType::I64,
            Band::F32(_) => SampleType::F32,
            Band::F64(_) => SampleType::F64,
        }
    }

    /// Sample at `idx` widened to `f64`.
    pub fn value(&self, idx: usize) -> Option<f64> {
        with_samples!(self, v => v.get(idx).and_then(|s| s.to_f64()))
    }

    /// All samples widened to `f64`.
    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        with_samples!(self, v => Box::new(v.iter().map(|s| s.to_f64().unwrap_or(f64::NAN))))
    }

    /// Whether bit `bit` (0 = least significant) of the sample at `idx` is set.
    ///
    /// Floating-point samples are truncated to an integer first. Returns
    /// `None` when `idx` is out of range or the sample has no integer value.
    pub fn bit(&self, idx: usize, bit: u32) -> Option<bool> {
        if bit >= 64 {
            return Some(false);
        }
        let bits = with_samples!(self, v => v.get(idx).and_then(sample_bits))?;
        Some(bits & (1u64 << bit) != 0)
    }

    /// Smallest and largest non-NaN sample.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.values()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A georeferenced pixel grid with one or more bands.
///
/// Immutable once built; share it behind an `Arc` between layers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRaster {
    width: usize,
    height: usize,
    bands: Vec<Band>,
    bounds: GeoBounds,
}

impl GeoRaster {
    pub fn new(width: usize, height: usize, bands: Vec<Band>, bounds: GeoBounds) -> Result<Self, LayerError> {
        if width == 0 || height == 0 {
            return Err(LayerError::Format(format!("empty raster {}x{}", width, height)));
        }
        if bands.is_empty() {
            return Err(LayerError::Format("raster has no bands".to_string()));
        }
        let expected = width * height;
        if let Some((i, band)) = bands.iter().enumerate().find(|(_, b)| b.len() != expected) {
            return Err(LayerError::Format(format!(
                "band {} has {} samples, expected {}",
                i,
                band.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            bands,
            bounds,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band(&self, index: usize) -> Option<&Band> {
        self.bands.get(index)
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Fail unless the raster carries at least `count` bands.
    pub fn require_bands(&self, count: usize) -> Result<(), LayerError> {
        if self.bands.len() < count {
            return Err(LayerError::Format(format!(
                "expected at least {} bands, found {}",
                count,
                self.bands.len()
            )));
        }
        Ok(())
    }

    /// Roof indicator for a mask raster: first band non-zero.
    pub fn is_roof(&self, idx: usize) -> bool {
        self.bands[0].value(idx).map(|v| v > 0.0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds::new(1.0, 0.0, 1.0, 0.0).unwrap()
    }

    #[test]
    fn test_band_bits() {
        let band = Band::U32(vec![0b101]);
        assert_eq!(band.bit(0, 0), Some(true));
        assert_eq!(band.bit(0, 1), Some(false));
        assert_eq!(band.bit(0, 2), Some(true));
        assert_eq!(band.bit(1, 0), None);

        let floats = Band::F32(vec![5.0]);
        assert_eq!(floats.bit(0, 2), Some(true));
        let nan = Band::F32(vec![f32::NAN]);
        assert_eq!(nan.bit(0, 0), None);
    }

    #[test]
    fn test_min_max_skips_nan() {
        let band = Band::F64(vec![3.5, f64::NAN, -1.25, 8.0]);
        assert_eq!(band.min_max(), Some((-1.25, 8.0)));
        assert_eq!(Band::F32(vec![]).min_max(), None);
    }

    #[test]
    fn test_raster_validates_band_lengths() {
        let ok = GeoRaster::new(2, 2, vec![Band::U8(vec![0, 1, 1, 0])], bounds());
        assert!(ok.is_ok());
        let bad = GeoRaster::new(2, 2, vec![Band::U8(vec![0, 1, 1])], bounds());
        assert!(matches!(bad, Err(LayerError::Format(_))));
        let none = GeoRaster::new(2, 2, vec![], bounds());
        assert!(none.is_err());
    }

    #[test]
    fn test_mask_roof_indicator() {
        let mask = GeoRaster::new(2, 1, vec![Band::U8(vec![0, 1])], bounds()).unwrap();
        assert!(!mask.is_roof(0));
        assert!(mask.is_roof(1));
        assert!(mask.require_bands(2).is_err());
    }
}
