/// Statute miles per nautical mile of arc (one arc-minute on the sphere).
const MILES_PER_ARC_MINUTE: f64 = 1.1515;
const KM_PER_MILE: f64 = 1.609344;
const NAUTICAL_PER_MILE: f64 = 0.8684;

/// Geodetic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    pub fn lat_rad(self) -> f64 {
        self.lat_deg.to_radians()
    }

    pub fn lon_rad(self) -> f64 {
        self.lon_deg.to_radians()
    }
}

/// Meters spanned by one degree of latitude at `lat_deg`.
pub fn meters_per_lat(lat_deg: f64) -> f64 {
    let phi = lat_deg.to_radians();
    111_132.92 - 559.82 * (2.0 * phi).cos() + 1.175 * (4.0 * phi).cos()
        - 0.0023 * (6.0 * phi).cos()
}

/// Meters spanned by one degree of longitude at `lat_deg`.
pub fn meters_per_lon(lat_deg: f64) -> f64 {
    let phi = lat_deg.to_radians();
    111_412.84 * phi.cos() - 93.5 * (3.0 * phi).cos() + 0.118 * (5.0 * phi).cos()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DistanceUnit {
    Miles,
    #[default]
    Kilometers,
    NauticalMiles,
}

/// Great-circle distance on a spherical earth (law of cosines).
pub fn great_circle_distance(a: GeoPoint, b: GeoPoint, unit: DistanceUnit) -> f64 {
    let theta = (a.lon_deg - b.lon_deg).to_radians();
    let cos_angle = a.lat_rad().sin() * b.lat_rad().sin()
        + a.lat_rad().cos() * b.lat_rad().cos() * theta.cos();
    // Rounding can push identical points slightly past 1.0.
    let angle_deg = cos_angle.clamp(-1.0, 1.0).acos().to_degrees();
    let miles = angle_deg * 60.0 * MILES_PER_ARC_MINUTE;

    match unit {
        DistanceUnit::Miles => miles,
        DistanceUnit::Kilometers => miles * KM_PER_MILE,
        DistanceUnit::NauticalMiles => miles * NAUTICAL_PER_MILE,
    }
}

#[cfg(test)]
mod tests {
    use super::{DistanceUnit, GeoPoint, great_circle_distance, meters_per_lat, meters_per_lon};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn degree_lengths_at_equator() {
        assert_close(meters_per_lat(0.0), 111_132.92 - 559.82 + 1.175 - 0.0023, 1e-9);
        assert_close(meters_per_lon(0.0), 111_412.84 - 93.5 + 0.118, 1e-9);
    }

    #[test]
    fn longitude_degree_shrinks_towards_poles() {
        assert!(meters_per_lon(60.0) < meters_per_lon(30.0));
        assert_close(meters_per_lon(90.0), 0.0, 1e-6);
        assert!(meters_per_lat(60.0) > meters_per_lat(0.0));
    }

    #[test]
    fn identical_points_do_not_produce_nan() {
        let p = GeoPoint::new(47.123456789, 8.987654321);
        let d = great_circle_distance(p, p, DistanceUnit::Kilometers);
        assert!(!d.is_nan());
        assert_close(d, 0.0, 1e-3);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = GeoPoint::new(10.0, 20.0);
        let b = GeoPoint::new(11.0, 20.0);
        let miles = great_circle_distance(a, b, DistanceUnit::Miles);
        assert_close(miles, 60.0 * 1.1515, 1e-6);
        assert_close(
            great_circle_distance(a, b, DistanceUnit::Kilometers),
            miles * 1.609344,
            1e-9,
        );
        assert_close(
            great_circle_distance(a, b, DistanceUnit::NauticalMiles),
            miles * 0.8684,
            1e-9,
        );
    }
}
