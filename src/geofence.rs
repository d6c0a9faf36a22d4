use crate::model::attendance::AttendanceStatus;
use crate::model::coordinate::{Coordinate, CoordinateError};

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in meters.
pub fn haversine_distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Decides the status of a captured position against the worker's assigned
/// site. Pure: same inputs, same answer, no side effects.
///
/// An employee with no assigned site always evaluates to PRESENT; there is
/// no geofence to be outside of.
/// The boundary is inclusive: a capture exactly `radius_m` away is PRESENT.
pub fn evaluate(
    site: Option<&Coordinate>,
    captured: &Coordinate,
    radius_m: f64,
) -> Result<AttendanceStatus, CoordinateError> {
    captured.validate()?;

    let Some(site) = site else {
        return Ok(AttendanceStatus::Present);
    };
    site.validate()?;

    if haversine_distance_m(site, captured) <= radius_m {
        Ok(AttendanceStatus::Present)
    } else {
        Ok(AttendanceStatus::OutOfBounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coord(latitude: f64, longitude: f64) -> Coordinate {
        Coordinate::new(latitude, longitude, None).unwrap()
    }

    const RIYADH_SITE: (f64, f64) = (24.7136, 46.6753);
    const RADIUS_M: f64 = 500.0;

    #[test]
    fn distance_to_self_is_zero() {
        let a = coord(24.7136, 46.6753);
        assert_eq!(haversine_distance_m(&a, &a), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(24.7136, 46.6753);
        let b = coord(24.8000, 46.7000);
        let ab = haversine_distance_m(&a, &b);
        let ba = haversine_distance_m(&b, &a);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn capture_at_the_site_is_present() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let status = evaluate(Some(&site), &site, RADIUS_M).unwrap();
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn capture_far_from_the_site_is_out_of_bounds() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let captured = coord(24.8000, 46.6753);

        let distance = haversine_distance_m(&site, &captured);
        assert!((distance - 9_626.0).abs() < 50.0, "distance was {distance}");

        let status = evaluate(Some(&site), &captured, RADIUS_M).unwrap();
        assert_eq!(status, AttendanceStatus::OutOfBounds);
    }

    #[test]
    fn no_assigned_site_is_always_present() {
        let far_away = coord(-33.8688, 151.2093);
        let status = evaluate(None, &far_away, RADIUS_M).unwrap();
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn boundary_is_inclusive() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let captured = coord(24.7136, 46.6753);
        let distance = haversine_distance_m(&site, &captured);
        // Exactly at the configured radius counts as on site.
        let status = evaluate(Some(&site), &captured, distance).unwrap();
        assert_eq!(status, AttendanceStatus::Present);
    }

    // Walk north in ~111 m steps; once the evaluation leaves the fence it
    // must never flip back to PRESENT.
    #[test]
    fn status_is_monotonic_in_distance() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let mut left_fence = false;
        for step in 0..200 {
            let captured = coord(RIYADH_SITE.0 + step as f64 * 0.001, RIYADH_SITE.1);
            let status = evaluate(Some(&site), &captured, RADIUS_M).unwrap();
            match status {
                AttendanceStatus::Present => {
                    assert!(!left_fence, "PRESENT after OUT_OF_BOUNDS at step {step}");
                }
                AttendanceStatus::OutOfBounds => left_fence = true,
                other => panic!("unexpected status {other:?}"),
            }
        }
        assert!(left_fence);
    }

    #[rstest]
    #[case(0.0, AttendanceStatus::Present)]
    #[case(0.002, AttendanceStatus::Present)]
    #[case(0.005, AttendanceStatus::OutOfBounds)]
    #[case(0.05, AttendanceStatus::OutOfBounds)]
    fn status_by_northward_offset(#[case] offset_deg: f64, #[case] expected: AttendanceStatus) {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let captured = coord(RIYADH_SITE.0 + offset_deg, RIYADH_SITE.1);
        assert_eq!(evaluate(Some(&site), &captured, RADIUS_M).unwrap(), expected);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let captured = coord(24.7150, 46.6760);
        let first = evaluate(Some(&site), &captured, RADIUS_M).unwrap();
        for _ in 0..10 {
            assert_eq!(evaluate(Some(&site), &captured, RADIUS_M).unwrap(), first);
        }
    }

    #[test]
    fn invalid_captured_coordinate_is_rejected() {
        let site = coord(RIYADH_SITE.0, RIYADH_SITE.1);
        let bad = Coordinate {
            latitude: f64::NAN,
            longitude: 46.6753,
            address: None,
        };
        assert!(evaluate(Some(&site), &bad, RADIUS_M).is_err());
    }

    #[test]
    fn invalid_site_coordinate_is_rejected() {
        let bad_site = Coordinate {
            latitude: 24.7136,
            longitude: 200.0,
            address: None,
        };
        let captured = coord(24.7136, 46.6753);
        assert!(evaluate(Some(&bad_site), &captured, RADIUS_M).is_err());
    }
}
