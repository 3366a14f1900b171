// SPDX-License-Identifier: MIT

//! Live session routes.
//!
//! The UI domain drives the canonical session over these endpoints: lifecycle
//! commands, location/capability ingest, and two read paths (a poll endpoint
//! and an SSE snapshot stream). All routes require identity.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{LocationSample, WalkSession};
use crate::services::WalkOutcome;
use crate::session::{CapabilityState, StopOutcome};
use crate::AppState;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/start", post(start_session))
        .route("/session/pause", post(pause_session))
        .route("/session/resume", post(resume_session))
        .route("/session/stop", post(stop_session))
        .route("/session/sync", post(sync_session))
        .route("/session/location", post(push_location))
        .route("/session/capability", post(set_capability))
        .route("/session/state", get(get_state))
        .route("/session/events", get(session_events))
}

// ─── Lifecycle ───────────────────────────────────────────────

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalkSession>> {
    let session = state.sessions.handle(&user.user_id).start().await?;
    Ok(Json(session))
}

async fn pause_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalkSession>> {
    let session = state.sessions.handle(&user.user_id).pause().await?;
    Ok(Json(session))
}

async fn resume_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalkSession>> {
    let session = state.sessions.handle(&user.user_id).resume().await?;
    Ok(Json(session))
}

/// Response to a stop (or a sync that carried a stop).
#[derive(Serialize)]
pub struct StopResponse {
    pub session: WalkSession,
    /// Whether a walk record was persisted.
    pub saved: bool,
    /// Set when the walk was discarded (below the distance threshold).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard_reason: Option<String>,
    /// Progression results when a walk was persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WalkOutcome>,
}

async fn stop_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<StopResponse>> {
    let handle = state.sessions.handle(&user.user_id);
    let stop = handle.stop().await?;
    let session = handle.snapshot();
    let response = finish_stop(&state, session, stop).await?;
    Ok(Json(response))
}

/// Run the persistence/progression pipeline for a stop outcome.
async fn finish_stop(
    state: &AppState,
    session: WalkSession,
    stop: StopOutcome,
) -> Result<StopResponse> {
    match stop {
        StopOutcome::Discarded { distance_meters } => Ok(StopResponse {
            session,
            saved: false,
            discard_reason: Some(format!(
                "walk too short to save ({:.1} m)",
                distance_meters
            )),
            outcome: None,
        }),
        StopOutcome::Completed(walk) => {
            let outcome = state.walks.process_completed_walk(&walk).await?;
            Ok(StopResponse {
                session,
                saved: true,
                discard_reason: None,
                outcome: Some(outcome),
            })
        }
    }
}

// ─── Sync ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SyncResponseBody {
    pub session: WalkSession,
    /// Present when the synced snapshot carried a stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopResponse>,
}

/// Reconcile a UI-held snapshot with the canonical session.
async fn sync_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut snapshot): Json<WalkSession>,
) -> Result<Json<SyncResponseBody>> {
    // The snapshot speaks for the authenticated user, whatever it claims.
    snapshot.user_id = user.user_id.clone();

    let response = state.sessions.handle(&user.user_id).sync(snapshot).await?;
    let stop = match response.stop_outcome {
        Some(outcome) => Some(finish_stop(&state, response.session.clone(), outcome).await?),
        None => None,
    };

    Ok(Json(SyncResponseBody {
        session: response.session,
        stop,
    }))
}

// ─── Feed ingest ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

/// Ingest a device GPS fix.
async fn push_location(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(sample): Json<LocationSample>,
) -> Result<Json<AcceptedResponse>> {
    sample
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid location sample: {}", e)))?;

    state.sessions.feed(&user.user_id).push_sample(sample);
    Ok(Json(AcceptedResponse { accepted: true }))
}

#[derive(Deserialize)]
pub struct CapabilityUpdate {
    pub available: bool,
    pub reason: Option<String>,
}

/// Report a capability change (permission revoked, GPS toggled, ...).
async fn set_capability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<CapabilityUpdate>,
) -> Result<Json<AcceptedResponse>> {
    let capability = if update.available {
        CapabilityState::available()
    } else {
        CapabilityState::lost(update.reason.unwrap_or_else(|| "capability lost".to_string()))
    };
    state.sessions.feed(&user.user_id).set_capability(capability);
    Ok(Json(AcceptedResponse { accepted: true }))
}

// ─── Read paths ──────────────────────────────────────────────

/// Poll fallback: the current canonical snapshot.
async fn get_state(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WalkSession>> {
    Ok(Json(state.sessions.handle(&user.user_id).snapshot()))
}

/// SSE stream of session snapshots. The first event is the current state;
/// subsequent events follow every canonical change (samples, ticker,
/// transitions). Dropping the connection unsubscribes.
async fn session_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let rx = state.sessions.handle(&user.user_id).subscribe();

    let stream = futures_util::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let snapshot = rx.borrow_and_update().clone();
        let event = Event::default().event("session").json_data(&snapshot);
        Some((event, (rx, false)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
