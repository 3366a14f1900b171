// SPDX-License-Identifier: MIT

//! Geodesic math for walk paths.
//!
//! Pure functions over [`LocationSample`] sequences: great-circle distance,
//! cumulative path distance, and spherical polygon area. Uses the haversine
//! formula on a spherical Earth; accuracy degrades near antipodal points,
//! which is acceptable for walk-scale paths.

use crate::models::LocationSample;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two samples in meters (haversine).
///
/// Symmetric; zero for identical coordinates.
pub fn haversine_distance(a: &LocationSample, b: &LocationSample) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Cumulative distance along a path in meters.
///
/// Returns 0 for fewer than two samples.
pub fn path_distance(samples: &[LocationSample]) -> f64 {
    samples
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum()
}

/// Area enclosed by the path in square meters, treating the samples as a
/// closed loop on a sphere (spherical-excess approximation).
///
/// Returns 0 for fewer than three samples. The result is unsigned; winding
/// direction does not matter.
pub fn polygon_area(samples: &[LocationSample]) -> f64 {
    if samples.len() < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..samples.len() {
        let a = &samples[i];
        let b = &samples[(i + 1) % samples.len()];

        let lon_a = a.longitude.to_radians();
        let lon_b = b.longitude.to_radians();
        let lat_a = a.latitude.to_radians();
        let lat_b = b.latitude.to_radians();

        sum += (lon_b - lon_a) * (2.0 + lat_a.sin() + lat_b.sin());
    }

    (sum * EARTH_RADIUS_METERS * EARTH_RADIUS_METERS / 2.0).abs()
}
