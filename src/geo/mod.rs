//! Spherical geometry shared by cache keying and result enrichment

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance between two points, in kilometers
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Initial bearing (forward azimuth) from one point to another,
/// normalized to [0, 360) degrees where 0 is due north.
pub fn initial_bearing_deg(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Integer cell indices of the fixed-size grid cell containing a point
pub fn grid_cell_indices(lat: f64, lng: f64, cell_degrees: f64) -> (i64, i64) {
    (
        (lat / cell_degrees).floor() as i64,
        (lng / cell_degrees).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero_distance() {
        let p = Coordinates::new(40.7128, -74.0060);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn test_haversine_known_distance() {
        // New York to Los Angeles, roughly 3936 km
        let nyc = Coordinates::new(40.7128, -74.0060);
        let la = Coordinates::new(34.0522, -118.2437);

        let d = haversine_km(nyc, la);
        assert!((d - 3936.0).abs() < 20.0, "got {}", d);
    }

    #[test]
    fn test_bearing_due_north() {
        let origin = Coordinates::new(40.0, -74.0);
        let north = Coordinates::new(41.0, -74.0);

        let bearing = initial_bearing_deg(origin, north);
        assert!(bearing.abs() < 0.01, "got {}", bearing);
    }

    #[test]
    fn test_bearing_due_east() {
        let origin = Coordinates::new(0.0, 0.0);
        let east = Coordinates::new(0.0, 1.0);

        let bearing = initial_bearing_deg(origin, east);
        assert!((bearing - 90.0).abs() < 0.01, "got {}", bearing);
    }

    #[test]
    fn test_grid_cell_indices_are_stable_within_cell() {
        let (a_lat, a_lng) = grid_cell_indices(40.7128, -74.0060, 0.01);
        let (b_lat, b_lng) = grid_cell_indices(40.7129, -74.0062, 0.01);
        assert_eq!((a_lat, a_lng), (b_lat, b_lng));

        let (c_lat, _) = grid_cell_indices(40.7228, -74.0060, 0.01);
        assert_ne!(a_lat, c_lat);
    }

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(40.0, -74.0).is_valid());
        assert!(Coordinates::new(-90.0, 180.0).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    }
}
