// SPDX-License-Identifier: MIT

//! Completed-walk processing pipeline.
//!
//! Handles the core workflow after a session stops with enough distance:
//! 1. Persist the walk record
//! 2. Update progression totals and the daily streak
//! 3. Award distance XP
//! 4. Fold the walk into today's challenges
//!
//! Steps 2-4 run under the user's progression lock so one completed walk is
//! processed at a time per user. If persistence fails after the live
//! session was already stopped, the failure is surfaced to the caller and
//! the walk data is lost; there is no durable retry queue.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{Challenge, CompletedWalk, StreakData};
use crate::services::challenges::ChallengeService;
use crate::services::progression::ProgressionService;
use crate::services::xp;
use serde::Serialize;

/// Processes completed walks into persisted records and progression updates.
#[derive(Clone)]
pub struct WalkProcessor {
    db: FirestoreDb,
    progression: ProgressionService,
    challenges: ChallengeService,
}

/// Everything a stop produced, for the response to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct WalkOutcome {
    pub walk_id: String,
    pub distance_meters: f64,
    pub xp_awarded: u64,
    pub total_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub streak: StreakData,
    pub challenges: Vec<Challenge>,
}

impl WalkProcessor {
    pub fn new(
        db: FirestoreDb,
        progression: ProgressionService,
        challenges: ChallengeService,
    ) -> Self {
        Self {
            db,
            progression,
            challenges,
        }
    }

    /// Persist a completed walk and apply all progression updates.
    pub async fn process_completed_walk(&self, walk: &CompletedWalk) -> Result<WalkOutcome> {
        let user_id = walk.user_id.clone();
        tracing::info!(
            user_id = %user_id,
            walk_id = %walk.id,
            distance_meters = walk.distance_meters,
            "Processing completed walk"
        );

        // Serialize per-user progression work: one walk at a time.
        let lock = self.progression.user_lock(&user_id);
        let _guard = lock.lock().await;

        let walk_id = self.db.save_walk(walk).await.inspect_err(|e| {
            // The session is already terminal at this point; without a
            // durable outbox a failed save loses the walk.
            tracing::warn!(user_id = %user_id, error = %e, "Walk save failed; walk data is lost");
        })?;

        // Totals go in first so the XP award sees fresh distance numbers.
        let mut progress = self.progression.get_progress(&user_id).await?;
        progress.apply_walk(walk);
        self.db.set_user_progress(&progress).await?;

        let (streak, _update) = self.progression.record_daily_activity(&user_id).await?;

        let award = xp::award_xp(
            &self.db,
            &user_id,
            xp::distance_xp(walk.distance_km()),
            "walk",
            false,
        )
        .await?;

        let challenges = self.challenges.apply_walk_progress(&user_id, walk).await?;

        Ok(WalkOutcome {
            walk_id,
            distance_meters: walk.distance_meters,
            xp_awarded: award.amount,
            total_xp: award.total_xp,
            new_level: award.new_level,
            leveled_up: award.leveled_up,
            streak,
            challenges,
        })
    }
}
