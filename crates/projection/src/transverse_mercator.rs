//! Transverse Mercator projection (ellipsoidal), including UTM.
//!
//! Uses the series expansions from Snyder, "Map Projections: A Working
//! Manual" (USGS PP 1395), pp. 60-64. Accuracy is well below a millimetre
//! within a UTM zone, which is far more than an overlay anchor needs.
//!
//! Angles in the public API are degrees; projected coordinates are metres.

use crate::ellipsoid::Ellipsoid;

/// UTM scale factor on the central meridian.
pub const UTM_SCALE: f64 = 0.9996;
/// UTM false easting in metres.
pub const UTM_FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for southern-hemisphere zones, in metres.
pub const UTM_SOUTH_FALSE_NORTHING: f64 = 10_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Longitude of the central meridian (degrees)
    pub lon0: f64,
    /// Latitude of origin (degrees)
    pub lat0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Meridian distance to `lat0`
    m0: f64,
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let m0 = meridian_distance(&ellipsoid, lat0.to_radians());
        Self {
            ellipsoid,
            lon0,
            lat0,
            k0,
            false_easting,
            false_northing,
            m0,
        }
    }

    /// UTM zone `zone` (1-60) on the given ellipsoid.
    pub fn utm(zone: u8, south: bool, ellipsoid: Ellipsoid) -> Self {
        let lon0 = -183.0 + 6.0 * zone as f64;
        let false_northing = if south { UTM_SOUTH_FALSE_NORTHING } else { 0.0 };
        Self::new(ellipsoid, lon0, 0.0, UTM_SCALE, UTM_FALSE_EASTING, false_northing)
    }

    /// Projected `(x, y)` in metres to `(lon, lat)` in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        // Footpoint latitude
        let m = self.m0 + (y - self.false_northing) / self.k0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
        let sqrt_1_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = sin1 / cos1;
        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = a / w.sqrt();
        let r1 = a * (1.0 - e2) / w.powf(1.5);
        let d = (x - self.false_easting) / (n1 * self.k0);

        let d2 = d * d;
        let lat = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0 - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d2 * d2 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d2
                        * d2
                        * d2
                        / 720.0);
        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d2 * d2 * d / 120.0)
            / cos1;

        // Adding in degrees keeps central-meridian points exact.
        (self.lon0 + dlon.to_degrees(), lat.to_degrees())
    }

    /// `(lon, lat)` in degrees to projected `(x, y)` in metres.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let ep2 = self.ellipsoid.ep2();

        let phi = lat.to_radians();
        let (sin, cos) = phi.sin_cos();
        let tan = sin / cos;
        let n = a / (1.0 - e2 * sin * sin).sqrt();
        let t = tan * tan;
        let c = ep2 * cos * cos;
        let big_a = (lon - self.lon0).to_radians() * cos;
        let m = meridian_distance(&self.ellipsoid, phi);

        let a2 = big_a * big_a;
        let x = self.false_easting
            + self.k0
                * n
                * (big_a
                    + (1.0 - t + c) * a2 * big_a / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a2 * a2 * big_a / 120.0);
        let y = self.false_northing
            + self.k0
                * (m - self.m0
                    + n * tan
                        * (a2 / 2.0
                            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a2 * a2 / 24.0
                            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a2 * a2 * a2 / 720.0));
        (x, y)
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_distance(ellipsoid: &Ellipsoid, phi: f64) -> f64 {
    let e2 = ellipsoid.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    ellipsoid.a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_central_meridians() {
        assert_eq!(TransverseMercator::utm(1, false, Ellipsoid::WGS84).lon0, -177.0);
        assert_eq!(TransverseMercator::utm(10, false, Ellipsoid::WGS84).lon0, -123.0);
        assert_eq!(TransverseMercator::utm(60, true, Ellipsoid::WGS84).lon0, 177.0);
    }

    #[test]
    fn test_equator_on_central_meridian() {
        let tm = TransverseMercator::utm(31, false, Ellipsoid::WGS84);
        let (lon, lat) = tm.inverse(UTM_FALSE_EASTING, 0.0);
        assert_eq!(lon, 3.0);
        assert_eq!(lat, 0.0);
    }

    #[test]
    fn test_meridian_distance_45() {
        let m = meridian_distance(&Ellipsoid::WGS84, 45f64.to_radians());
        assert!((m - 4_984_944.378).abs() < 0.01, "M(45) = {}", m);
    }

    #[test]
    fn test_southern_false_northing() {
        let tm = TransverseMercator::utm(56, true, Ellipsoid::WGS84);
        let (x, y) = tm.forward(153.0, -27.5);
        assert!((x - UTM_FALSE_EASTING).abs() < 1e-6);
        assert!(y > 6_900_000.0 && y < 7_000_000.0, "y = {}", y);
    }
}
