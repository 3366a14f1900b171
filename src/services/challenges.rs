// SPDX-License-Identifier: MIT

//! Daily challenge issuance and progress.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Challenge, CompletedWalk, ProgressOutcome, RewardKind};
use crate::services::xp;
use crate::time_utils::DateSource;

/// Challenge service: day-scoped goals with one-time rewards.
#[derive(Clone)]
pub struct ChallengeService {
    db: FirestoreDb,
    dates: DateSource,
}

impl ChallengeService {
    pub fn new(db: FirestoreDb, dates: DateSource) -> Self {
        Self { db, dates }
    }

    /// Issue today's challenges, at most once per calendar day.
    ///
    /// Idempotent: if challenges already exist for today they are returned
    /// unchanged; otherwise exactly three fresh challenges are created.
    pub async fn generate_daily_challenges(&self, user_id: &str) -> Result<Vec<Challenge>> {
        let today = self.dates.today();

        let existing = self.db.get_challenges_for_date(user_id, today).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let challenges = Challenge::daily_set(user_id, today);
        self.db.batch_set_challenges(&challenges).await?;
        tracing::info!(user_id, date = %today, count = challenges.len(), "Daily challenges issued");
        Ok(challenges)
    }

    /// Set absolute progress on a challenge (clamped to [0, 100]).
    ///
    /// Returns `None` for an unknown id. An already-completed challenge is
    /// a no-op returning the unchanged record; the reward is granted
    /// exactly once, on the call that first reaches 100%.
    pub async fn update_challenge_progress(
        &self,
        user_id: &str,
        challenge_id: &str,
        progress_percent: f64,
    ) -> Result<Option<Challenge>> {
        let Some(mut challenge) = self.db.get_challenge(challenge_id).await? else {
            return Ok(None);
        };

        if challenge.user_id != user_id {
            return Err(AppError::BadRequest(format!(
                "challenge {} belongs to another user",
                challenge_id
            )));
        }

        match challenge.apply_progress(progress_percent) {
            ProgressOutcome::AlreadyCompleted => Ok(Some(challenge)),
            ProgressOutcome::Updated { newly_completed } => {
                self.db.set_challenge(&challenge).await?;
                if newly_completed {
                    self.grant_reward(&challenge).await?;
                }
                Ok(Some(challenge))
            }
        }
    }

    /// Fold a completed walk into today's incomplete challenges.
    ///
    /// Each distance goal gains `walk_km / target_km` of its bar; rewards
    /// go through the same one-shot completion gate as manual updates.
    pub async fn apply_walk_progress(
        &self,
        user_id: &str,
        walk: &CompletedWalk,
    ) -> Result<Vec<Challenge>> {
        let today = self.dates.today();
        let mut challenges = self.db.get_challenges_for_date(user_id, today).await?;

        for challenge in challenges.iter_mut() {
            let delta = challenge.goal.progress_from_walk(walk.distance_km());
            match challenge.add_progress(delta) {
                ProgressOutcome::AlreadyCompleted => {}
                ProgressOutcome::Updated { newly_completed } => {
                    self.db.set_challenge(challenge).await?;
                    if newly_completed {
                        tracing::info!(
                            user_id,
                            challenge_id = %challenge.id,
                            "Challenge completed by walk"
                        );
                        self.grant_reward(challenge).await?;
                    }
                }
            }
        }

        Ok(challenges)
    }

    async fn grant_reward(&self, challenge: &Challenge) -> Result<()> {
        match challenge.reward.kind {
            RewardKind::Xp => {
                xp::award_xp(
                    &self.db,
                    &challenge.user_id,
                    challenge.reward.amount,
                    "challenge",
                    true,
                )
                .await?;
            }
        }
        Ok(())
    }
}
