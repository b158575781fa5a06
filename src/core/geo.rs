//! Great-circle distance and the naive travel-time estimate.
//!
//! Pure functions only; no I/O.

use crate::domain::model::{GeoPoint, RouteEstimate};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 40.0;

/// Where the map opens before any location is chosen (Sydney).
pub const DEFAULT_MAP_CENTER: GeoPoint = GeoPoint {
    lat: -33.8688,
    lng: 151.2093,
};

/// Haversine distance between two points in kilometres.
pub fn haversine_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Minutes needed to cover `distance_km` at a constant `average_speed_kmh`, rounded.
///
/// Non-finite or non-positive inputs yield 0.
pub fn estimate_duration_minutes(distance_km: f64, average_speed_kmh: f64) -> u32 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    if !average_speed_kmh.is_finite() || average_speed_kmh <= 0.0 {
        return 0;
    }
    (distance_km / average_speed_kmh * 60.0).round() as u32
}

/// Arithmetic mean of both coordinates. Cheap, and not a true geodesic midpoint.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    GeoPoint {
        lat: (a.lat + b.lat) / 2.0,
        lng: (a.lng + b.lng) / 2.0,
    }
}

pub fn route_estimate(pickup: GeoPoint, dropoff: GeoPoint, average_speed_kmh: f64) -> RouteEstimate {
    let distance_km = haversine_distance_km(pickup, dropoff);
    RouteEstimate {
        distance_km,
        duration_minutes: estimate_duration_minutes(distance_km, average_speed_kmh),
        midpoint: midpoint(pickup, dropoff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    #[test]
    fn test_sydney_short_hop() {
        let pickup = point(-33.8688, 151.2093);
        let dropoff = point(-33.8568, 151.2153);

        let distance = haversine_distance_km(pickup, dropoff);
        assert!((distance - 1.4).abs() < 0.1, "distance was {}", distance);
        assert_eq!(estimate_duration_minutes(distance, DEFAULT_AVERAGE_SPEED_KMH), 2);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let samples = [
            point(-33.8688, 151.2093),
            point(51.5074, -0.1278),
            point(0.0, 0.0),
            point(89.9, 179.9),
            point(-90.0, -180.0),
        ];
        for a in samples {
            assert_eq!(haversine_distance_km(a, a), 0.0);
            for b in samples {
                assert_eq!(haversine_distance_km(a, b), haversine_distance_km(b, a));
                assert!(haversine_distance_km(a, b) >= 0.0);
            }
        }
    }

    #[test]
    fn test_antipodal_points_stay_finite() {
        let distance = haversine_distance_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!(distance.is_finite());
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_grows_with_separation() {
        let origin = point(0.0, 0.0);
        let mut previous = 0.0;
        for step in 1..=18 {
            let d = haversine_distance_km(origin, point(0.0, step as f64 * 10.0));
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn test_duration_rounding() {
        assert_eq!(estimate_duration_minutes(0.0, 40.0), 0);
        assert_eq!(estimate_duration_minutes(10.0, 40.0), 15);
        assert_eq!(estimate_duration_minutes(0.3, 40.0), 0);
        assert_eq!(estimate_duration_minutes(2.0, 40.0), 3);
        assert_eq!(estimate_duration_minutes(120.0, 60.0), 120);
        assert_eq!(estimate_duration_minutes(-5.0, 40.0), 0);
        assert_eq!(estimate_duration_minutes(f64::NAN, 40.0), 0);
        assert_eq!(estimate_duration_minutes(10.0, 0.0), 0);
    }

    #[test]
    fn test_duration_matches_formula() {
        for tenths in 0..500 {
            let km = tenths as f64 / 10.0;
            let expected = (km / 40.0 * 60.0).round() as u32;
            assert_eq!(estimate_duration_minutes(km, DEFAULT_AVERAGE_SPEED_KMH), expected);
        }
    }

    #[test]
    fn test_midpoint_is_plain_mean() {
        let mid = midpoint(point(-34.0, 150.0), point(-33.0, 152.0));
        assert_eq!(mid, GeoPoint { lat: -33.5, lng: 151.0 });
    }

    #[test]
    fn test_route_estimate_combines_all_three() {
        let estimate = route_estimate(point(-33.8688, 151.2093), point(-33.8568, 151.2153), 40.0);
        assert_eq!(estimate.duration_minutes, 2);
        assert_eq!(estimate.formatted_distance(), "1.4 km");
        assert!((estimate.midpoint.lat - -33.8628).abs() < 1e-9);
    }
}
