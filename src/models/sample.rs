// SPDX-License-Identifier: MIT

//! GPS location sample model.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single GPS fix (WGS84), produced only by a location feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LocationSample {
    /// Latitude in degrees
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude in degrees
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Fix timestamp (epoch milliseconds)
    pub timestamp_ms: i64,
    /// Altitude in meters, if the fix carried one
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters
    #[validate(range(min = 0.0))]
    pub accuracy_m: f64,
}

impl LocationSample {
    /// Build a bare sample (no altitude, zero accuracy). Mostly for tests
    /// and geometry math that only needs coordinates.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            altitude: None,
            accuracy_m: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validation_bounds() {
        let ok = LocationSample::new(37.4, -122.1, 1_700_000_000_000);
        assert!(ok.validate().is_ok());

        let bad_lat = LocationSample::new(91.0, 0.0, 0);
        assert!(bad_lat.validate().is_err());

        let bad_lon = LocationSample::new(0.0, -181.0, 0);
        assert!(bad_lon.validate().is_err());

        let mut bad_accuracy = LocationSample::new(0.0, 0.0, 0);
        bad_accuracy.accuracy_m = -1.0;
        assert!(bad_accuracy.validate().is_err());
    }
}
