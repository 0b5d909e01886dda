//! Great-circle distance and display formatting.

use rcfinder_core::Coordinate;

const EARTH_RADIUS_MILES: f64 = 3958.8;
const FEET_PER_MILE: f64 = 5280.0;

/// Haversine great-circle distance in miles between two coordinates.
///
/// Symmetric, non-negative, and zero for identical points.
#[must_use]
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Format a distance for display.
///
/// Under 0.1 mi the distance is shown in whole feet; under 10 mi with one
/// decimal; otherwise as whole miles.
#[must_use]
pub fn format_distance(miles: f64) -> String {
    if miles < 0.1 {
        let feet = (miles * FEET_PER_MILE).round();
        format!("{feet:.0} ft")
    } else if miles < 10.0 {
        format!("{miles:.1} mi")
    } else {
        format!("{:.0} mi", miles.round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOWNTOWN_LA: Coordinate = Coordinate::new(34.0522, -118.2437);
    const SANTA_MONICA: Coordinate = Coordinate::new(34.0195, -118.4912);

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance_miles(DOWNTOWN_LA, DOWNTOWN_LA).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_miles(DOWNTOWN_LA, SANTA_MONICA);
        let ba = distance_miles(SANTA_MONICA, DOWNTOWN_LA);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn distance_downtown_to_santa_monica_is_plausible() {
        let miles = distance_miles(DOWNTOWN_LA, SANTA_MONICA);
        // Roughly 14 miles as the crow flies.
        assert!(miles > 13.0 && miles < 16.0, "got {miles}");
    }

    #[test]
    fn distance_is_non_negative() {
        let a = Coordinate::new(33.70, -118.43);
        let b = Coordinate::new(34.90, -117.65);
        assert!(distance_miles(a, b) >= 0.0);
    }

    #[test]
    fn format_short_distances_in_feet() {
        assert_eq!(format_distance(0.05), "264 ft");
        assert_eq!(format_distance(0.0), "0 ft");
    }

    #[test]
    fn format_mid_distances_with_one_decimal() {
        assert_eq!(format_distance(0.1), "0.1 mi");
        assert_eq!(format_distance(2.34), "2.3 mi");
        assert_eq!(format_distance(9.99), "10.0 mi");
    }

    #[test]
    fn format_long_distances_as_whole_miles() {
        assert_eq!(format_distance(10.0), "10 mi");
        assert_eq!(format_distance(15.6), "16 mi");
    }
}
