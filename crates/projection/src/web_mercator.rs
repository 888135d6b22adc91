//! Spherical ("pseudo") Mercator used by web maps, EPSG:3857.

use std::f64::consts::FRAC_PI_2;

/// Sphere radius in metres (the WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Projected `(x, y)` in metres to `(lon, lat)` in degrees.
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    (lon, lat)
}

/// `(lon, lat)` in degrees to projected `(x, y)` in metres.
pub fn forward(lon: f64, lat: f64) -> (f64, f64) {
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}
