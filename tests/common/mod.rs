// SPDX-License-Identifier: MIT

use std::sync::Arc;
use stride_tracker::config::Config;
use stride_tracker::db::FirestoreDb;
use stride_tracker::routes::create_router;
use stride_tracker::services::{ChallengeService, ProgressionService, WalkProcessor};
use stride_tracker::session::SessionRegistry;
use stride_tracker::time_utils::DateSource;
use stride_tracker::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app backed by the given database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let dates = DateSource::System;

    let progression = ProgressionService::new(db.clone(), dates);
    let challenges = ChallengeService::new(db.clone(), dates);
    let walks = WalkProcessor::new(db.clone(), progression.clone(), challenges.clone());
    let sessions = SessionRegistry::new(config.min_walk_distance_meters);

    let state = Arc::new(AppState {
        config,
        db,
        sessions,
        walks,
        progression,
        challenges,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with an offline mock database.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}
