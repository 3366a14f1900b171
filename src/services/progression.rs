// SPDX-License-Identifier: MIT

//! Progression operations over the persistence gateway.
//!
//! These operations are read-modify-write and are NOT internally safe
//! against concurrent invocation for the same user. Callers serialize
//! per-user work through [`ProgressionService::user_lock`]; the walk
//! pipeline and the freeze-card and challenge routes all do.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{StreakData, StreakUpdate, UserProgress};
use crate::time_utils::DateSource;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Progression service: streaks and progress records.
#[derive(Clone)]
pub struct ProgressionService {
    db: FirestoreDb,
    dates: DateSource,
    user_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ProgressionService {
    pub fn new(db: FirestoreDb, dates: DateSource) -> Self {
        Self {
            db,
            dates,
            user_locks: Arc::new(DashMap::new()),
        }
    }

    /// Per-user lock for serializing progression mutations.
    pub fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// The user's progression record, defaulting to a fresh one.
    pub async fn get_progress(&self, user_id: &str) -> Result<UserProgress> {
        Ok(self
            .db
            .get_user_progress(user_id)
            .await?
            .unwrap_or_else(|| UserProgress::new(user_id)))
    }

    /// Record "activity happened today" against the streak.
    ///
    /// Idempotent for repeated same-day calls. The streak value is
    /// persisted as a whole replacement.
    pub async fn record_daily_activity(
        &self,
        user_id: &str,
    ) -> Result<(StreakData, StreakUpdate)> {
        let today = self.dates.today();
        let mut progress = self.get_progress(user_id).await?;

        let update = progress.streak.record_activity(today);
        if update != StreakUpdate::AlreadyRecorded {
            self.db.set_user_progress(&progress).await?;
        }

        tracing::debug!(user_id, ?update, streak = progress.streak.daily_streak, "Daily activity recorded");
        Ok((progress.streak, update))
    }

    /// Spend a freeze card to forgive exactly one missed day.
    ///
    /// Returns the streak state and whether a card was consumed; a false
    /// result means the preconditions were not met and nothing changed.
    pub async fn use_freeze_card(&self, user_id: &str) -> Result<(StreakData, bool)> {
        let today = self.dates.today();
        let mut progress = self.get_progress(user_id).await?;

        let used = progress.streak.use_freeze_card(today);
        if used {
            self.db.set_user_progress(&progress).await?;
            tracing::info!(user_id, streak = progress.streak.daily_streak, "Freeze card used");
        }
        Ok((progress.streak, used))
    }
}
