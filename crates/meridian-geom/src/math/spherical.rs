// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::Loc;
use core::f64::consts::TAU;

// Radii kept exactly as the editor's measurements have always used them so
// that distances compared against 0.75 m / 5 m thresholds stay comparable.
const EQUATORIAL_RADIUS: f64 = 6_356_752.314_245_179;
const POLAR_RADIUS: f64 = 6_378_137.0;

/// Converts a latitude delta in degrees to meters.
#[must_use]
pub fn lat_to_meters(dlat: f64) -> f64 {
    dlat * (TAU * POLAR_RADIUS / 360.0)
}

/// Converts a longitude delta in degrees at latitude `at_lat` to meters.
#[must_use]
pub fn lon_to_meters(dlon: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        return 0.0;
    }
    dlon * (TAU * EQUATORIAL_RADIUS / 360.0) * at_lat.to_radians().cos().abs()
}

/// Converts meters to a latitude delta in degrees.
#[must_use]
pub fn meters_to_lat(m: f64) -> f64 {
    m / (TAU * POLAR_RADIUS / 360.0)
}

/// Converts meters to a longitude delta in degrees at latitude `at_lat`.
#[must_use]
pub fn meters_to_lon(m: f64, at_lat: f64) -> f64 {
    if at_lat.abs() >= 90.0 {
        return 0.0;
    }
    m / (TAU * EQUATORIAL_RADIUS / 360.0) / at_lat.to_radians().cos().abs()
}

/// Equirectangular approximation of the distance between two points, in meters.
#[must_use]
pub fn spherical_distance(a: Loc, b: Loc) -> f64 {
    let x = lon_to_meters(a[0] - b[0], (a[1] + b[1]) / 2.0);
    let y = lat_to_meters(a[1] - b[1]);
    x.hypot(y)
}

/// Finds the location in `locs` closest to `point`.
///
/// Returns the index and the distance in meters, or `None` for an empty slice.
/// Ties keep the earliest index.
#[must_use]
pub fn spherical_closest(locs: &[Loc], point: Loc) -> Option<(usize, f64)> {
    locs.iter()
        .enumerate()
        .map(|(i, loc)| (i, spherical_distance(*loc, point)))
        .fold(None, |best, (i, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((i, d)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude_is_about_111km() {
        let d = spherical_distance([0.0, 0.0], [0.0, 1.0]);
        assert!((d - 111_319.49).abs() < 1.0, "got {d}");
    }

    #[test]
    fn meters_round_trip_through_degrees() {
        let lat = 47.5;
        let dlon = meters_to_lon(5.0, lat);
        assert!((lon_to_meters(dlon, lat) - 5.0).abs() < 1e-9);
        assert!((lat_to_meters(meters_to_lat(5.0)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn closest_prefers_first_on_tie() {
        let locs = [[1.0, 0.0], [-1.0, 0.0], [0.5, 0.0]];
        assert_eq!(spherical_closest(&locs, [0.0, 0.0]).map(|(i, _)| i), Some(2));
        let tie = [[1.0, 0.0], [-1.0, 0.0]];
        assert_eq!(spherical_closest(&tie, [0.0, 0.0]).map(|(i, _)| i), Some(0));
        assert!(spherical_closest(&[], [0.0, 0.0]).is_none());
    }
}
