// SPDX-License-Identifier: MIT

//! XP and leveling math.
//!
//! 10 XP per kilometer walked; advancing from level N requires N × 100
//! cumulative XP, so a single large award can skip several levels.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::UserProgress;

const XP_PER_KM: f64 = 10.0;
const XP_PER_LEVEL_STEP: u64 = 100;

/// XP earned for a walked distance in kilometers.
pub fn distance_xp(km: f64) -> u64 {
    (km * XP_PER_KM).round().max(0.0) as u64
}

/// Cumulative XP required to advance from `level` to `level + 1`.
pub fn threshold_for_level(level: u32) -> u64 {
    level as u64 * XP_PER_LEVEL_STEP
}

/// Level-up check supporting multi-level jumps.
///
/// Returns `(leveled_up, new_level)`; the level is incremented repeatedly
/// while the total XP meets the next threshold.
pub fn check_level_up(total_xp: u64, current_level: u32) -> (bool, u32) {
    let mut level = current_level.max(1);
    while total_xp >= threshold_for_level(level) {
        level += 1;
    }
    (level > current_level, level)
}

/// Outcome of an XP award.
#[derive(Debug, Clone, Copy)]
pub struct XpAward {
    pub amount: u64,
    pub total_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Award XP to a user and persist the updated record.
///
/// Not internally serialized: concurrent awards for the same user must be
/// serialized by the caller (see the per-user lock in the walk pipeline).
pub async fn award_xp(
    db: &FirestoreDb,
    user_id: &str,
    amount: u64,
    source: &str,
    is_bonus: bool,
) -> Result<XpAward> {
    let mut progress = db
        .get_user_progress(user_id)
        .await?
        .unwrap_or_else(|| UserProgress::new(user_id));

    progress.xp += amount;
    let (leveled_up, new_level) = check_level_up(progress.xp, progress.level);
    progress.level = new_level;

    db.set_user_progress(&progress).await?;

    tracing::info!(
        user_id,
        amount,
        source,
        is_bonus,
        total_xp = progress.xp,
        new_level,
        leveled_up,
        "XP awarded"
    );

    Ok(XpAward {
        amount,
        total_xp: progress.xp,
        new_level,
        leveled_up,
    })
}
