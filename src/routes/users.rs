// SPDX-License-Identifier: MIT

//! User profile routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::User;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

const MAX_DISPLAY_NAME_LEN: usize = 64;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/display-name", put(set_display_name))
}

/// Current user profile, created on first sight.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let now = format_utc_rfc3339(chrono::Utc::now());

    let profile = match state.db.get_user(&user.user_id).await? {
        Some(mut profile) => {
            profile.last_active = now;
            profile
        }
        None => User {
            user_id: user.user_id.clone(),
            display_name: user.user_id.clone(),
            created_at: now.clone(),
            last_active: now,
        },
    };

    state.db.upsert_user(&profile).await?;
    Ok(Json(profile))
}

#[derive(Deserialize)]
pub struct DisplayNameRequest {
    pub display_name: String,
}

/// Set the leaderboard display name.
async fn set_display_name(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<DisplayNameRequest>,
) -> Result<Json<User>> {
    let display_name = request.display_name.trim();
    if display_name.is_empty() || display_name.len() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "display_name must be 1-{} characters",
            MAX_DISPLAY_NAME_LEN
        )));
    }

    let now = format_utc_rfc3339(chrono::Utc::now());
    let mut profile = state.db.get_user(&user.user_id).await?.unwrap_or(User {
        user_id: user.user_id.clone(),
        display_name: String::new(),
        created_at: now.clone(),
        last_active: now.clone(),
    });

    profile.display_name = display_name.to_string();
    profile.last_active = now;
    state.db.upsert_user(&profile).await?;

    Ok(Json(profile))
}
