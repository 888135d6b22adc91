//! GeoKey directory parsing.
//!
//! The directory (tag 34735) is a flat array of `u16`:
//! a 4-value header `[version, revision, minor, key_count]` followed by
//! `key_count` entries of `[key_id, tag_location, count, value_or_offset]`.
//! `tag_location` 0 means the value is the short itself; 34736 and 34737
//! point into the double and ASCII parameter tags.

use solar_common::{GeoKeyDirectory, GeoKeyValue};

use crate::error::DecodeError;

pub const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
pub const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
pub const GEO_ASCII_PARAMS_TAG: u16 = 34737;

const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 4;

/// Parse the raw GeoKey tags into a keyed directory.
pub fn parse_geo_keys(directory: &[u16], doubles: &[f64], ascii: &str) -> Result<GeoKeyDirectory, DecodeError> {
    if directory.len() < HEADER_LEN {
        return Err(DecodeError::MalformedGeoKeys(format!(
            "header needs {} values, found {}",
            HEADER_LEN,
            directory.len()
        )));
    }
    if directory[0] != 1 {
        return Err(DecodeError::MalformedGeoKeys(format!(
            "unsupported directory version {}",
            directory[0]
        )));
    }

    let key_count = directory[3] as usize;
    let needed = HEADER_LEN + key_count * ENTRY_LEN;
    if directory.len() < needed {
        return Err(DecodeError::MalformedGeoKeys(format!(
            "{} keys need {} values, found {}",
            key_count,
            needed,
            directory.len()
        )));
    }

    let mut keys = GeoKeyDirectory::new();
    for entry in directory[HEADER_LEN..needed].chunks_exact(ENTRY_LEN) {
        let (key, location, count, offset) = (entry[0], entry[1], entry[2] as usize, entry[3] as usize);
        let value = match location {
            0 => GeoKeyValue::Short(entry[3]),
            GEO_DOUBLE_PARAMS_TAG => {
                let values = doubles.get(offset..offset + count).ok_or_else(|| {
                    DecodeError::MalformedGeoKeys(format!(
                        "key {} reads doubles {}..{} of {}",
                        key,
                        offset,
                        offset + count,
                        doubles.len()
                    ))
                })?;
                GeoKeyValue::Double(values.to_vec())
            }
            GEO_ASCII_PARAMS_TAG => {
                let text = ascii.get(offset..offset + count).ok_or_else(|| {
                    DecodeError::MalformedGeoKeys(format!(
                        "key {} reads ASCII {}..{} of {}",
                        key,
                        offset,
                        offset + count,
                        ascii.len()
                    ))
                })?;
                // Each ASCII value is terminated with '|' in the params tag.
                GeoKeyValue::Ascii(text.trim_end_matches(['|', '\0']).to_string())
            }
            GEO_KEY_DIRECTORY_TAG => {
                let value = directory.get(offset).copied().ok_or_else(|| {
                    DecodeError::MalformedGeoKeys(format!("key {} points past the directory", key))
                })?;
                GeoKeyValue::Short(value)
            }
            other => {
                return Err(DecodeError::MalformedGeoKeys(format!(
                    "key {} stored in unsupported tag {}",
                    key, other
                )))
            }
        };
        keys.insert(key, value);
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_common::georef::keys;

    #[test]
    fn test_parse_utm_directory() {
        let directory = [
            1, 1, 0, 4, // version 1.1.0, four keys
            1024, 0, 1, 1, // projected model
            1025, 0, 1, 1, // pixel is area
            1026, GEO_ASCII_PARAMS_TAG, 22, 0, // citation
            3072, 0, 1, 32610, // WGS 84 / UTM zone 10N
        ];
        let dir = parse_geo_keys(&directory, &[], "WGS 84 / UTM zone 10N|").unwrap();
        assert_eq!(dir.short(keys::PROJECTED_CS_TYPE), Some(32610));
        assert_eq!(dir.short(keys::GT_MODEL_TYPE), Some(1));
        assert_eq!(dir.ascii(keys::GT_CITATION), Some("WGS 84 / UTM zone 10N"));
    }

    #[test]
    fn test_parse_double_params() {
        let directory = [1, 1, 0, 2, 3080, GEO_DOUBLE_PARAMS_TAG, 1, 1, 3092, GEO_DOUBLE_PARAMS_TAG, 1, 0];
        let dir = parse_geo_keys(&directory, &[0.9996, -123.0], "").unwrap();
        assert_eq!(dir.double(keys::PROJ_NAT_ORIGIN_LONG), Some(-123.0));
        assert_eq!(dir.double(keys::PROJ_SCALE_AT_NAT_ORIGIN), Some(0.9996));
    }

    #[test]
    fn test_rejects_truncated_directory() {
        let directory = [1, 1, 0, 2, 1024, 0, 1, 1];
        assert!(matches!(
            parse_geo_keys(&directory, &[], ""),
            Err(DecodeError::MalformedGeoKeys(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_double() {
        let directory = [1, 1, 0, 1, 3082, GEO_DOUBLE_PARAMS_TAG, 1, 5];
        assert!(parse_geo_keys(&directory, &[1.0], "").is_err());
    }
}
