// SPDX-License-Identifier: MIT

//! Progression, challenge, and leaderboard routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Challenge, StreakData, UserProgress};
use crate::services::{leaderboard, LeaderboardMetric};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LEADERBOARD_LIMIT: u32 = 25;
const MAX_LEADERBOARD_LIMIT: u32 = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/progress", get(get_progress))
        .route("/api/progress/freeze", post(use_freeze_card))
        .route("/api/challenges", get(get_challenges))
        .route("/api/challenges/{challenge_id}/progress", post(update_challenge))
        .route("/api/leaderboard", get(get_leaderboard))
}

// ─── Progress & streaks ──────────────────────────────────────

/// The user's full progression record (XP, level, totals, streak).
async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProgress>> {
    let progress = state.progression.get_progress(&user.user_id).await?;
    Ok(Json(progress))
}

#[derive(Serialize)]
pub struct FreezeCardResponse {
    pub used: bool,
    pub streak: StreakData,
}

/// Spend a freeze card to bridge yesterday's missed day.
async fn use_freeze_card(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FreezeCardResponse>> {
    // Same per-user lock as the walk pipeline: streaks are read-modify-write.
    let lock = state.progression.user_lock(&user.user_id);
    let _guard = lock.lock().await;

    let (streak, used) = state.progression.use_freeze_card(&user.user_id).await?;
    if !used {
        return Err(AppError::BadRequest(
            "No freeze card applicable: requires an available card and exactly one missed day"
                .to_string(),
        ));
    }
    Ok(Json(FreezeCardResponse { used, streak }))
}

// ─── Challenges ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ChallengesResponse {
    pub challenges: Vec<Challenge>,
}

/// Today's challenges, generated on first call of the day.
async fn get_challenges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ChallengesResponse>> {
    // Generation is a read-then-write (check today's set, batch-create if
    // absent); two concurrent first-of-day calls would both pass the check
    // without the per-user lock.
    let lock = state.progression.user_lock(&user.user_id);
    let _guard = lock.lock().await;

    let challenges = state
        .challenges
        .generate_daily_challenges(&user.user_id)
        .await?;
    Ok(Json(ChallengesResponse { challenges }))
}

#[derive(Deserialize)]
pub struct ChallengeProgressRequest {
    pub progress_percent: f64,
}

/// Report absolute progress against one challenge.
async fn update_challenge(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(challenge_id): Path<String>,
    Json(request): Json<ChallengeProgressRequest>,
) -> Result<Json<Challenge>> {
    if !request.progress_percent.is_finite() {
        return Err(AppError::BadRequest(
            "progress_percent must be a finite number".to_string(),
        ));
    }

    // Completion may award XP; hold the progression lock like the walk
    // pipeline does.
    let lock = state.progression.user_lock(&user.user_id);
    let _guard = lock.lock().await;

    let challenge = state
        .challenges
        .update_challenge_progress(&user.user_id, &challenge_id, request.progress_percent)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Challenge {} not found", challenge_id)))?;

    Ok(Json(challenge))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    #[serde(default)]
    metric: LeaderboardMetric,
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: String,
    pub level: u32,
    pub xp: u64,
    pub value: f64,
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub metric: LeaderboardMetric,
    pub entries: Vec<LeaderboardEntry>,
}

/// Ranked leaderboard over a progression metric.
async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT);

    let snapshots = state.db.get_leaderboard_snapshot(query.metric, limit).await?;
    let ranked = leaderboard::rank(snapshots, query.metric);

    let entries = ranked
        .into_iter()
        .enumerate()
        .map(|(i, progress)| LeaderboardEntry {
            rank: i as u32 + 1,
            value: match query.metric {
                LeaderboardMetric::Distance => progress.total_distance_meters,
                LeaderboardMetric::Area => progress.total_area_sq_meters,
            },
            user_id: progress.user_id,
            level: progress.level,
            xp: progress.xp,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        metric: query.metric,
        entries,
    }))
}
