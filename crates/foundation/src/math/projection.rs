use std::f64::consts::PI;

use super::GeoPoint;

/// Normalized spherical (Web) Mercator coordinates.
///
/// Both axes span `[0, 1]`; `y` grows southwards.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Mercator {
    pub x: f64,
    pub y: f64,
}

impl Mercator {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_geo(geo: GeoPoint) -> Self {
        let sin_lat = geo.lat_rad().sin();
        let x = (geo.lon_deg + 180.0) / 360.0;
        let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);
        Self { x, y }
    }

    pub fn to_geo(self) -> GeoPoint {
        let lon = self.x * 360.0 - 180.0;
        let lat = (2.0 * PI * (0.5 - self.y)).tanh().asin().to_degrees();
        GeoPoint::new(lat, lon)
    }
}
