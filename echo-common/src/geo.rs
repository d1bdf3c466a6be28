//! Great-circle distance math
//!
//! The nearby-memories query evaluates the same formula inside SQLite; this
//! module is the reference implementation used for aggregation and tests.

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two WGS-84 points, in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // Clamp guards against rounding pushing the argument past 1.0 for
    // antipodal or coincident points.
    EARTH_RADIUS_KM * 2.0 * a.sqrt().clamp(-1.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_have_zero_distance() {
        let d = haversine_km(40.7128, -74.0060, 40.7128, -74.0060);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn new_york_to_los_angeles() {
        // Great-circle distance is roughly 3936 km
        let d = haversine_km(40.7128, -74.0060, 34.0522, -118.2437);
        assert!((d - 3936.0).abs() < 10.0, "distance was {}", d);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = haversine_km(51.5074, -0.1278, 48.8566, 2.2936);
        let b = haversine_km(48.8566, 2.2936, 51.5074, -0.1278);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(40.0, -74.0, 41.0, -74.0);
        assert!((d - 111.19).abs() < 0.5, "distance was {}", d);
    }
}
