//! Great-circle distance between consecutive fixes
//!
//! Coordinates come in as degrees; distances go out in meters on a
//! spherical Earth of fixed radius.

use std::f64::consts::PI;

use geo::Point;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two lat/lon pairs.
///
/// Returns `0.0` when any of the four values is exactly `0.0`: that value
/// is the "no fix" marker in recorded tracks, not the equator or the prime
/// meridian.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == 0.0 || lon1 == 0.0 || lat2 == 0.0 || lon2 == 0.0 {
        return 0.0;
    }

    let phi1 = lat1 * PI / 180.0;
    let phi2 = lat2 * PI / 180.0;
    let delta_phi = (lat2 - lat1) * PI / 180.0;
    let delta_lambda = (lon2 - lon1) * PI / 180.0;

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two optional fixes; a missing fix on either end
/// contributes nothing.
pub fn fix_distance(from: Option<Point<f64>>, to: Option<Point<f64>>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => haversine_distance(a.y(), a.x(), b.y(), b.x()),
        _ => 0.0,
    }
}
