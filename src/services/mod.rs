// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod challenges;
pub mod leaderboard;
pub mod progression;
pub mod walks;
pub mod xp;

pub use challenges::ChallengeService;
pub use leaderboard::LeaderboardMetric;
pub use progression::ProgressionService;
pub use walks::{WalkOutcome, WalkProcessor};
pub use xp::XpAward;
