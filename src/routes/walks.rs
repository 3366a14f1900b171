// SPDX-License-Identifier: MIT

//! Walk history routes.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::CompletedWalk;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/walks", get(get_walks))
        .route("/api/walks/{walk_id}", delete(delete_walk))
}

#[derive(Deserialize)]
struct WalksQuery {
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct WalksResponse {
    pub walks: Vec<CompletedWalk>,
}

/// List the user's walks, most recent first.
async fn get_walks(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WalksQuery>,
) -> Result<Json<WalksResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let walks = state.db.get_walks_for_user(&user.user_id, limit).await?;
    Ok(Json(WalksResponse { walks }))
}

#[derive(Serialize)]
pub struct DeleteWalkResponse {
    pub deleted: bool,
}

/// Delete one of the user's walks.
async fn delete_walk(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(walk_id): Path<String>,
) -> Result<Json<DeleteWalkResponse>> {
    let walk = state
        .db
        .get_walk(&walk_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Walk {} not found", walk_id)))?;

    // Ownership check: a walk id is opaque but not secret.
    if walk.user_id != user.user_id {
        return Err(AppError::NotFound(format!("Walk {} not found", walk_id)));
    }

    state.db.delete_walk(&walk_id).await?;
    tracing::info!(user_id = %user.user_id, walk_id = %walk_id, "Walk deleted");

    Ok(Json(DeleteWalkResponse { deleted: true }))
}
