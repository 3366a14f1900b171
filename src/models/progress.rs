// SPDX-License-Identifier: MIT

//! User progression record: XP, level, totals, and daily streak.
//!
//! Streak transitions are pure methods on [`StreakData`] driven by a caller
//! supplied calendar date, mirroring how derived stats elsewhere in the
//! crate take the clock as an argument. Persistence always replaces the
//! whole `streak` value to avoid partial-update races.

use crate::models::CompletedWalk;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Streak length interval at which a freeze card is granted.
const FREEZE_CARD_INTERVAL: u32 = 7;

/// Daily activity streak state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreakData {
    /// Consecutive calendar days with at least one recorded activity.
    #[serde(default)]
    pub daily_streak: u32,
    /// Most recent activity date (ISO calendar date).
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
    /// Grace tokens; each forgives exactly one missed day.
    #[serde(default)]
    pub freeze_cards_available: u32,
}

/// What a `record_activity` call did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// First recorded activity ever.
    Started,
    /// Already recorded today; nothing changed.
    AlreadyRecorded,
    /// Streak extended by one day.
    Extended { freeze_card_granted: bool },
    /// One missed day forgiven by consuming a freeze card, then extended.
    ExtendedWithFreeze { freeze_card_granted: bool },
    /// Gap too large (or no card to cover it); streak restarted at 1.
    Reset,
}

impl StreakData {
    /// Record activity for `today` and update the streak.
    ///
    /// Idempotent for repeated same-day calls. Every time the streak lands
    /// on a multiple of 7 a freeze card is granted.
    pub fn record_activity(&mut self, today: NaiveDate) -> StreakUpdate {
        let Some(last) = self.last_activity_date else {
            self.daily_streak = 1;
            self.last_activity_date = Some(today);
            return StreakUpdate::Started;
        };

        let gap_days = (today - last).num_days();
        match gap_days {
            // Same day (or a clock running backwards): nothing to do.
            d if d <= 0 => StreakUpdate::AlreadyRecorded,
            1 => {
                self.daily_streak += 1;
                self.last_activity_date = Some(today);
                let granted = self.grant_freeze_card_if_due();
                StreakUpdate::Extended {
                    freeze_card_granted: granted,
                }
            }
            2 if self.freeze_cards_available > 0 => {
                // Exactly one missed day and a card to cover it: spend the
                // card and keep the streak going.
                self.freeze_cards_available -= 1;
                self.daily_streak += 1;
                self.last_activity_date = Some(today);
                let granted = self.grant_freeze_card_if_due();
                StreakUpdate::ExtendedWithFreeze {
                    freeze_card_granted: granted,
                }
            }
            _ => {
                // Gap of 2 with no card, or any gap > 2. Cards are kept.
                self.daily_streak = 1;
                self.last_activity_date = Some(today);
                StreakUpdate::Reset
            }
        }
    }

    /// Explicitly spend a freeze card to forgive exactly one missed day.
    ///
    /// Only meaningful when the last activity was exactly two calendar days
    /// ago and a card is available: consumes one card, moves
    /// `last_activity_date` to today, and leaves the streak untouched.
    /// Returns false (no-op) otherwise.
    pub fn use_freeze_card(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_activity_date else {
            return false;
        };
        if (today - last).num_days() != 2 || self.freeze_cards_available == 0 {
            return false;
        }

        self.freeze_cards_available -= 1;
        self.last_activity_date = Some(today);
        true
    }

    fn grant_freeze_card_if_due(&mut self) -> bool {
        if self.daily_streak > 0 && self.daily_streak % FREEZE_CARD_INTERVAL == 0 {
            self.freeze_cards_available += 1;
            true
        } else {
            false
        }
    }
}

/// Progression record for one user.
///
/// Stored whole in the `user_progress` collection and mutated only by the
/// progression layer; fields never decrease except for a streak reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    /// Lifetime XP (non-negative).
    #[serde(default)]
    pub xp: u64,
    /// Current level (≥ 1).
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub total_distance_meters: f64,
    /// Sum of enclosed areas over walks that had one.
    #[serde(default)]
    pub total_area_sq_meters: f64,
    #[serde(default)]
    pub total_walks: u32,
    #[serde(default)]
    pub streak: StreakData,
}

fn default_level() -> u32 {
    1
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            xp: 0,
            level: 1,
            total_distance_meters: 0.0,
            total_area_sq_meters: 0.0,
            total_walks: 0,
            streak: StreakData::default(),
        }
    }

    /// Fold a completed walk into the lifetime totals.
    pub fn apply_walk(&mut self, walk: &CompletedWalk) {
        self.total_distance_meters += walk.distance_meters;
        if let Some(area) = walk.area_sq_meters {
            self.total_area_sq_meters += area;
        }
        self.total_walks += 1;
    }
}
