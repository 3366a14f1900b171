// SPDX-License-Identifier: MIT

//! Persisted walk record.

use crate::geometry;
use crate::models::session::{WalkSession, WalkStatus};
use crate::time_utils::format_utc_rfc3339;
use geo::{Coord, LineString};
use serde::{Deserialize, Serialize};

/// Path polyline precision (5 decimal places, ~1 m resolution).
const POLYLINE_PRECISION: u32 = 5;

/// A completed, persisted walk.
///
/// Created exactly once, at session stop, and immutable thereafter except
/// for deletion. The ordered lat/lon path is stored polyline-encoded to
/// keep documents compact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedWalk {
    /// Walk ID (UUID v4, also used as document ID)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Encoded path (polyline precision 5)
    pub path_polyline: String,
    /// Total path distance in meters
    pub distance_meters: f64,
    /// Total duration in milliseconds (pauses excluded)
    pub duration_ms: i64,
    /// Enclosed area in square meters, when the path has enough points
    pub area_sq_meters: Option<f64>,
    /// Number of GPS fixes in the path
    pub point_count: usize,
    /// Walk completion time (ISO 8601)
    pub timestamp: String,
}

/// Errors building a walk record from a session.
#[derive(Debug, thiserror::Error)]
pub enum WalkBuildError {
    #[error("session is not stopped")]
    SessionNotStopped,

    #[error("failed to encode path: {0}")]
    PathEncoding(String),
}

impl CompletedWalk {
    /// Build a walk record from a stopped session.
    ///
    /// The caller decides whether the walk is worth keeping (distance
    /// threshold); this only freezes the session into a record.
    pub fn from_session(
        session: &WalkSession,
        completed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Self, WalkBuildError> {
        if session.status != WalkStatus::Stopped {
            return Err(WalkBuildError::SessionNotStopped);
        }

        let coords = session
            .samples
            .iter()
            .map(|s| Coord {
                x: s.longitude,
                y: s.latitude,
            })
            .collect::<Vec<_>>();
        let path_polyline = polyline::encode_coordinates(coords, POLYLINE_PRECISION)
            .map_err(|e| WalkBuildError::PathEncoding(e.to_string()))?;

        let area_sq_meters = if session.samples.len() >= 3 {
            Some(geometry::polygon_area(&session.samples))
        } else {
            None
        };

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: session.user_id.clone(),
            path_polyline,
            distance_meters: session.distance_meters,
            duration_ms: session.elapsed_ms,
            area_sq_meters,
            point_count: session.point_count,
            timestamp: format_utc_rfc3339(completed_at),
        })
    }

    /// Decode the stored path back into a line string (x = lon, y = lat).
    pub fn path(&self) -> Result<LineString<f64>, String> {
        polyline::decode_polyline(&self.path_polyline, POLYLINE_PRECISION)
            .map_err(|e| e.to_string())
    }

    /// Distance in kilometers (convenience for XP math).
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }
}
