// SPDX-License-Identifier: MIT

//! Leaderboard ranking.

use crate::models::UserProgress;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Metric a leaderboard is ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardMetric {
    #[default]
    Distance,
    Area,
}

impl LeaderboardMetric {
    /// Firestore field the metric maps to.
    pub fn field_name(&self) -> &'static str {
        match self {
            LeaderboardMetric::Distance => "total_distance_meters",
            LeaderboardMetric::Area => "total_area_sq_meters",
        }
    }

    fn value(&self, progress: &UserProgress) -> f64 {
        match self {
            LeaderboardMetric::Distance => progress.total_distance_meters,
            LeaderboardMetric::Area => progress.total_area_sq_meters,
        }
    }
}

/// Stable descending sort by the chosen metric; ties keep insertion order.
pub fn rank(mut snapshots: Vec<UserProgress>, metric: LeaderboardMetric) -> Vec<UserProgress> {
    snapshots.sort_by(|a, b| {
        metric
            .value(b)
            .partial_cmp(&metric.value(a))
            .unwrap_or(Ordering::Equal)
    });
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(user_id: &str, distance: f64, area: f64) -> UserProgress {
        let mut p = UserProgress::new(user_id);
        p.total_distance_meters = distance;
        p.total_area_sq_meters = area;
        p
    }

    #[test]
    fn test_rank_by_distance() {
        let ranked = rank(
            vec![progress("u1", 100.0, 0.0), progress("u2", 200.0, 0.0)],
            LeaderboardMetric::Distance,
        );
        let order: Vec<&str> = ranked.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(order, ["u2", "u1"]);
    }

    #[test]
    fn test_rank_by_area_independent_of_distance() {
        let ranked = rank(
            vec![progress("u1", 500.0, 10.0), progress("u2", 100.0, 50.0)],
            LeaderboardMetric::Area,
        );
        let order: Vec<&str> = ranked.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(order, ["u2", "u1"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let ranked = rank(
            vec![
                progress("first", 100.0, 0.0),
                progress("second", 100.0, 0.0),
                progress("third", 100.0, 0.0),
            ],
            LeaderboardMetric::Distance,
        );
        let order: Vec<&str> = ranked.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }
}
