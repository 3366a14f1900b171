// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod challenge;
pub mod progress;
pub mod sample;
pub mod session;
pub mod user;
pub mod walk;

pub use challenge::{Challenge, ChallengeGoal, ProgressOutcome, Reward, RewardKind};
pub use progress::{StreakData, StreakUpdate, UserProgress};
pub use sample::LocationSample;
pub use session::{merge_snapshot, SyncDecision, WalkSession, WalkStatus};
pub use user::User;
pub use walk::CompletedWalk;
