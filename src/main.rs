// SPDX-License-Identifier: MIT

//! Stride-Tracker API Server
//!
//! Records GPS walk sessions, with the canonical live session owned by a
//! background task per user, and drives the progression engine (XP, streaks,
//! challenges, leaderboards) from completed walks.

use std::sync::Arc;
use stride_tracker::{
    config::Config,
    db::FirestoreDb,
    services::{ChallengeService, ProgressionService, WalkProcessor},
    session::SessionRegistry,
    time_utils::DateSource,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env();
    tracing::info!(port = config.port, "Starting Stride-Tracker API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Progression engine services
    let dates = DateSource::System;
    let progression = ProgressionService::new(db.clone(), dates);
    let challenges = ChallengeService::new(db.clone(), dates);
    let walks = WalkProcessor::new(db.clone(), progression.clone(), challenges.clone());

    // Per-user live session controllers
    let sessions = SessionRegistry::new(config.min_walk_distance_meters);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sessions,
        walks,
        progression,
        challenges,
    });

    // Build router
    let app = stride_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stride_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
