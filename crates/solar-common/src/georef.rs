//! GeoTIFF coordinate-reference metadata (GeoKeys).

use std::collections::BTreeMap;

/// Well-known GeoKey identifiers.
pub mod keys {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GT_CITATION: u16 = 1026;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const GEOG_GEODETIC_DATUM: u16 = 2050;
    pub const GEOG_ANGULAR_UNITS: u16 = 2054;
    pub const GEOG_ELLIPSOID: u16 = 2056;
    pub const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
    pub const GEOG_INV_FLATTENING: u16 = 2059;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
    pub const PROJECTION: u16 = 3074;
    pub const PROJ_COORD_TRANS: u16 = 3075;
    pub const PROJ_LINEAR_UNITS: u16 = 3076;
    pub const PROJ_NAT_ORIGIN_LONG: u16 = 3080;
    pub const PROJ_NAT_ORIGIN_LAT: u16 = 3081;
    pub const PROJ_FALSE_EASTING: u16 = 3082;
    pub const PROJ_FALSE_NORTHING: u16 = 3083;
    pub const PROJ_SCALE_AT_NAT_ORIGIN: u16 = 3092;
}

/// Value of a single GeoKey.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyValue {
    Short(u16),
    Double(Vec<f64>),
    Ascii(String),
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoKeyDirectory {
    entries: BTreeMap<u16, GeoKeyValue>,
}

impl GeoKeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: u16, value: GeoKeyValue) {
        self.entries.insert(key, value);
    }

    pub fn with_short(mut self, key: u16, value: u16) -> Self {
        self.insert(key, GeoKeyValue::Short(value));
        self
    }

    pub fn with_double(mut self, key: u16, value: f64) -> Self {
        self.insert(key, GeoKeyValue::Double(vec![value]));
        self
    }

    pub fn get(&self, key: u16) -> Option<&GeoKeyValue> {
        self.entries.get(&key)
    }

    pub fn short(&self, key: u16) -> Option<u16> {
        match self.entries.get(&key)? {
            GeoKeyValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn double(&self, key: u16) -> Option<f64> {
        match self.entries.get(&key)? {
            GeoKeyValue::Double(v) => v.first().copied(),
            GeoKeyValue::Short(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn ascii(&self, key: u16) -> Option<&str> {
        match self.entries.get(&key)? {
            GeoKeyValue::Ascii(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::keys::*;
    use super::*;

    #[test]
    fn test_typed_lookups() {
        let mut dir = GeoKeyDirectory::new()
            .with_short(PROJECTED_CS_TYPE, 32610)
            .with_double(PROJ_FALSE_EASTING, 500000.0);
        dir.insert(GT_CITATION, GeoKeyValue::Ascii("WGS 84 / UTM zone 10N".into()));

        assert_eq!(dir.short(PROJECTED_CS_TYPE), Some(32610));
        assert_eq!(dir.double(PROJ_FALSE_EASTING), Some(500000.0));
        assert_eq!(dir.ascii(GT_CITATION), Some("WGS 84 / UTM zone 10N"));
        assert_eq!(dir.short(GT_CITATION), None);
        assert_eq!(dir.len(), 3);
    }
}
