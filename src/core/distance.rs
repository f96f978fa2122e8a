use crate::models::UserProfile;

/// Earth's mean radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Finite and within the latitude/longitude ranges
#[inline]
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// Distance between two profiles
///
/// `None` unless both profiles carry a valid latitude and longitude.
pub fn profile_distance(a: &UserProfile, b: &UserProfile) -> Option<f64> {
    let (lat1, lon1) = a.coordinates()?;
    let (lat2, lon2) = b.coordinates()?;

    if !is_valid_coordinate(lat1, lon1) || !is_valid_coordinate(lat2, lon2) {
        return None;
    }

    Some(haversine_distance(lat1, lon1, lat2, lon2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Distance from London to Paris (approximately 344 km)
        let london_lat = 51.5074;
        let london_lon = -0.1278;
        let paris_lat = 48.8566;
        let paris_lon = 2.3522;

        let distance = haversine_distance(london_lat, london_lon, paris_lat, paris_lon);
        assert!((distance - 344.0).abs() < 10.0, "Distance should be ~344km, got {}", distance);
    }

    #[test]
    fn test_identical_points() {
        assert_eq!(haversine_distance(52.52, 13.405, 52.52, 13.405), 0.0);
    }

    #[test]
    fn test_profile_distance_requires_both_coordinates() {
        let berlin = UserProfile::new("a").with_location(52.52, 13.405);
        let mut half = UserProfile::new("b");
        half.latitude = Some(52.5);

        assert!(profile_distance(&berlin, &half).is_none());
        assert!(profile_distance(&UserProfile::new("c"), &berlin).is_none());
    }

    #[test]
    fn test_invalid_coordinates_are_absent() {
        let berlin = UserProfile::new("a").with_location(52.52, 13.405);
        let nan = UserProfile::new("b").with_location(f64::NAN, 13.4);
        let out_of_range = UserProfile::new("c").with_location(95.0, 13.4);

        assert!(profile_distance(&berlin, &nan).is_none());
        assert!(profile_distance(&berlin, &out_of_range).is_none());
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
        assert!(is_valid_coordinate(-90.0, 180.0));
    }
}
