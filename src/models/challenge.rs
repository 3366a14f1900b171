// SPDX-License-Identifier: MIT

//! Daily challenge model.
//!
//! Goals are a tagged union dispatched by pure evaluation functions, not by
//! subclassing; new goal kinds extend the enum.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a challenge asks the user to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeGoal {
    /// Walk a total of `target_km` kilometers today.
    Distance { target_km: f64 },
}

impl ChallengeGoal {
    /// Percentage points this goal earns from a walk of `distance_km`.
    pub fn progress_from_walk(&self, distance_km: f64) -> f64 {
        match self {
            ChallengeGoal::Distance { target_km } => {
                if *target_km <= 0.0 {
                    100.0
                } else {
                    (distance_km / target_km) * 100.0
                }
            }
        }
    }
}

/// What completing a challenge grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Xp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub amount: u64,
    pub kind: RewardKind,
}

/// Outcome of applying progress to a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Challenge was already completed; nothing changed, no reward due.
    AlreadyCompleted,
    /// Progress updated. `newly_completed` is true exactly once, on the
    /// call that first reaches 100%.
    Updated { newly_completed: bool },
}

/// A day-scoped goal with a one-time reward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Challenge ID (UUID v4, also used as document ID)
    pub id: String,
    pub user_id: String,
    pub goal: ChallengeGoal,
    pub reward: Reward,
    /// Progress in [0, 100].
    #[serde(default)]
    pub progress_percent: f64,
    /// Monotonic false → true; never reverts.
    #[serde(default)]
    pub completed: bool,
    /// Calendar day this challenge belongs to.
    pub assigned_date: NaiveDate,
}

impl Challenge {
    fn new(user_id: &str, goal: ChallengeGoal, reward_xp: u64, date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            goal,
            reward: Reward {
                amount: reward_xp,
                kind: RewardKind::Xp,
            },
            progress_percent: 0.0,
            completed: false,
            assigned_date: date,
        }
    }

    /// The fixed set of three challenges issued each day.
    pub fn daily_set(user_id: &str, date: NaiveDate) -> Vec<Challenge> {
        vec![
            Challenge::new(user_id, ChallengeGoal::Distance { target_km: 1.0 }, 25, date),
            Challenge::new(user_id, ChallengeGoal::Distance { target_km: 3.0 }, 50, date),
            Challenge::new(user_id, ChallengeGoal::Distance { target_km: 5.0 }, 100, date),
        ]
    }

    /// Set absolute progress, clamped to [0, 100].
    ///
    /// Completed challenges are a no-op: progress never moves and the
    /// reward is never due twice.
    pub fn apply_progress(&mut self, progress_percent: f64) -> ProgressOutcome {
        if self.completed {
            return ProgressOutcome::AlreadyCompleted;
        }

        self.progress_percent = progress_percent.clamp(0.0, 100.0);
        let newly_completed = self.progress_percent >= 100.0;
        if newly_completed {
            self.completed = true;
        }
        ProgressOutcome::Updated { newly_completed }
    }

    /// Add progress on top of the current value (walk contribution path).
    pub fn add_progress(&mut self, delta_percent: f64) -> ProgressOutcome {
        if self.completed {
            return ProgressOutcome::AlreadyCompleted;
        }
        self.apply_progress(self.progress_percent + delta_percent.max(0.0))
    }
}
