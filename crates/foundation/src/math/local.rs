use super::{GeoPoint, Vec2, meters_per_lat, meters_per_lon};

/// Flat local frame centered on a geodetic origin.
///
/// Degree lengths are evaluated at the origin latitude, so the mapping is
/// exactly invertible. `scale` is meters per local unit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    origin: GeoPoint,
    scale: f64,
    meters_per_lat: f64,
    meters_per_lon: f64,
}

impl LocalFrame {
    pub fn new(origin: GeoPoint, scale: f64) -> Self {
        Self {
            origin,
            scale,
            meters_per_lat: meters_per_lat(origin.lat_deg),
            meters_per_lon: meters_per_lon(origin.lat_deg),
        }
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Re-centers every later conversion on `origin`.
    pub fn set_origin(&mut self, origin: GeoPoint) {
        *self = Self::new(origin, self.scale);
    }

    pub fn geo_to_local(&self, geo: GeoPoint) -> Vec2 {
        let z = self.meters_per_lat * (geo.lat_deg - self.origin.lat_deg);
        let x = self.meters_per_lon * (geo.lon_deg - self.origin.lon_deg);
        Vec2::new(x / self.scale, z / self.scale)
    }

    pub fn local_to_geo(&self, local: Vec2) -> GeoPoint {
        let lat = self.origin.lat_deg + local.z * self.scale / self.meters_per_lat;
        let lon = self.origin.lon_deg + local.x * self.scale / self.meters_per_lon;
        GeoPoint::new(lat, lon)
    }
}
