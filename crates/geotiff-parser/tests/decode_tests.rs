//! End-to-end decoding of synthesized GeoTIFF payloads.

use geotiff_parser::{decode, DecodeError, ModelTransform};
use solar_common::georef::keys;
use solar_common::{Band, BoundingBox, SampleType};
use test_utils::GeoTiffBuilder;

fn utm_mask(width: u32, height: u32, values: Vec<u8>) -> Vec<u8> {
    GeoTiffBuilder::new(width, height)
        .band_u8(values)
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true)
        .build()
}

#[test]
fn test_decode_single_band_mask() {
    let decoded = decode(&utm_mask(4, 2, vec![0, 1, 1, 0, 0, 1, 1, 0])).unwrap();

    assert_eq!((decoded.width, decoded.height), (4, 2));
    assert_eq!(decoded.bands, vec![Band::U8(vec![0, 1, 1, 0, 0, 1, 1, 0])]);
    assert_eq!(decoded.model_bbox, BoundingBox::new(576000.0, 4144999.0, 576002.0, 4145000.0));
    assert_eq!(decoded.geo_keys.short(keys::PROJECTED_CS_TYPE), Some(32610));
    assert_eq!(decoded.geo_keys.short(keys::PROJ_LINEAR_UNITS), Some(9001));
}

#[test]
fn test_decode_rgb_deinterleaves() {
    let bytes = GeoTiffBuilder::new(2, 1)
        .band_u8(vec![10, 11])
        .band_u8(vec![20, 21])
        .band_u8(vec![30, 31])
        .origin(576000.0, 4145000.0)
        .pixel_size(0.1, 0.1)
        .utm(10, true)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(
        decoded.bands,
        vec![Band::U8(vec![10, 11]), Band::U8(vec![20, 21]), Band::U8(vec![30, 31])]
    );
}

#[test]
fn test_decode_monthly_float_bands() {
    let mut builder = GeoTiffBuilder::new(3, 2)
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true);
    for month in 0..12 {
        builder = builder.band_f32(vec![month as f32 * 10.0; 6]);
    }
    let decoded = decode(&builder.build()).unwrap();

    assert_eq!(decoded.bands.len(), 12);
    assert!(decoded.bands.iter().all(|b| b.sample_type() == SampleType::F32));
    assert_eq!(decoded.bands[7].value(4), Some(70.0));
}

#[test]
fn test_decode_u32_bit_fields() {
    let bytes = GeoTiffBuilder::new(2, 1)
        .band_u32(vec![0b101, 0])
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.bands[0].bit(0, 0), Some(true));
    assert_eq!(decoded.bands[0].bit(0, 1), Some(false));
    assert_eq!(decoded.bands[0].bit(0, 2), Some(true));
}

#[test]
fn test_decode_affine_transformation() {
    #[rustfmt::skip]
    let matrix = [
        0.5, 0.0, 0.0, 576000.0,
        0.0, -0.5, 0.0, 4145000.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    let bytes = GeoTiffBuilder::new(2, 2)
        .band_u16(vec![1, 2, 3, 4])
        .affine(matrix)
        .utm(10, true)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert!(matches!(decoded.transform, ModelTransform::Affine(_)));
    assert_eq!(decoded.model_bbox, BoundingBox::new(576000.0, 4144999.0, 576001.0, 4145000.0));
}

#[test]
fn test_decode_double_and_ascii_keys() {
    let bytes = GeoTiffBuilder::new(1, 1)
        .band_f64(vec![1.5])
        .origin(500000.0, 0.0)
        .pixel_size(1.0, 1.0)
        .geo_key_short(keys::GT_MODEL_TYPE, 1)
        .geo_key_ascii(keys::GT_CITATION, "custom transverse mercator")
        .geo_key_double(keys::PROJ_NAT_ORIGIN_LONG, -123.0)
        .geo_key_double(keys::PROJ_SCALE_AT_NAT_ORIGIN, 0.9996)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.geo_keys.ascii(keys::GT_CITATION), Some("custom transverse mercator"));
    assert_eq!(decoded.geo_keys.double(keys::PROJ_NAT_ORIGIN_LONG), Some(-123.0));
    assert_eq!(decoded.geo_keys.double(keys::PROJ_SCALE_AT_NAT_ORIGIN), Some(0.9996));
}

#[test]
fn test_missing_geokeys_yield_empty_directory() {
    let bytes = GeoTiffBuilder::new(1, 1)
        .band_u8(vec![1])
        .origin(0.0, 0.0)
        .pixel_size(1.0, 1.0)
        .build();
    let decoded = decode(&bytes).unwrap();
    assert!(decoded.geo_keys.is_empty());
}

#[test]
fn test_missing_georeference_is_rejected() {
    let bytes = GeoTiffBuilder::new(1, 1).band_u8(vec![1]).utm(10, true).build();
    assert!(matches!(decode(&bytes), Err(DecodeError::MissingGeoreference)));
}

#[test]
fn test_decode_hourly_shade_bands() {
    let mut builder = GeoTiffBuilder::new(2, 1)
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true);
    for hour in 0..24u32 {
        builder = builder.band_u32(vec![hour, 0b101]);
    }
    let decoded = decode(&builder.build()).unwrap();

    assert_eq!(decoded.bands.len(), 24);
    assert_eq!(decoded.bands[23], Band::U32(vec![23, 0b101]));
    assert_eq!(decoded.bands[9].bit(1, 2), Some(true));
}

#[test]
fn test_decode_planar_layout() {
    let mut builder = GeoTiffBuilder::new(3, 2)
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true)
        .planar_separate();
    for month in 0..12 {
        builder = builder.band_f32((0..6).map(|px| month as f32 * 10.0 + px as f32).collect());
    }
    let decoded = decode(&builder.build()).unwrap();

    assert_eq!(decoded.bands.len(), 12);
    assert_eq!(decoded.bands[0].value(5), Some(5.0));
    assert_eq!(decoded.bands[11].value(0), Some(110.0));
    assert_eq!(decoded.bands[11].value(4), Some(114.0));
}

#[test]
fn test_planar_matches_interleaved() {
    let build = |planar: bool| {
        let builder = GeoTiffBuilder::new(2, 2)
            .band_u8(vec![1, 2, 3, 4])
            .band_u8(vec![5, 6, 7, 8])
            .band_u8(vec![9, 10, 11, 12])
            .origin(0.0, 0.0)
            .pixel_size(1.0, 1.0);
        if planar {
            builder.planar_separate().build()
        } else {
            builder.build()
        }
    };
    assert_eq!(decode(&build(true)).unwrap().bands, decode(&build(false)).unwrap().bands);
}

#[test]
fn test_decode_tiles_clip_padding() {
    // 5x3 image in 2x2 tiles: three tiles across, two down, padded edges.
    let values: Vec<u16> = (0..15).collect();
    let bytes = GeoTiffBuilder::new(5, 3)
        .band_u16(values.clone())
        .band_u16(values.iter().map(|v| v * 100).collect())
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .tiled(2, 2)
        .build();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.bands[0], Band::U16(values));
    assert_eq!(decoded.bands[1].value(14), Some(1400.0));
}

#[test]
fn test_decode_deflate_with_predictor() {
    let mask: Vec<u8> = (0..24).map(|i| (i * 7 % 5) as u8).collect();
    let bytes = GeoTiffBuilder::new(6, 4)
        .band_u8(mask.clone())
        .origin(576000.0, 4145000.0)
        .pixel_size(0.5, 0.5)
        .utm(10, true)
        .horizontal_predictor()
        .deflate()
        .build();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.bands, vec![Band::U8(mask)]);
}

#[test]
fn test_decode_tiled_planar_deflate() {
    let red: Vec<u8> = (0..12).collect();
    let green: Vec<u8> = (100..112).collect();
    let bytes = GeoTiffBuilder::new(4, 3)
        .band_u8(red.clone())
        .band_u8(green.clone())
        .origin(0.0, 0.0)
        .pixel_size(1.0, 1.0)
        .planar_separate()
        .tiled(2, 2)
        .deflate()
        .build();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.bands, vec![Band::U8(red), Band::U8(green)]);
}

#[test]
fn test_truncated_payload_is_rejected() {
    let bytes = utm_mask(4, 2, vec![1; 8]);
    assert!(decode(&bytes[..bytes.len() / 2]).is_err());
}

#[test]
fn test_decoding_is_deterministic() {
    let bytes = utm_mask(4, 2, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    let a = decode(&bytes).unwrap();
    let b = decode(&bytes).unwrap();
    assert_eq!(a.bands, b.bands);
    assert_eq!(a.model_bbox, b.model_bbox);
    assert_eq!(a.geo_keys, b.geo_keys);
}
