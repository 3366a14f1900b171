// SPDX-License-Identifier: MIT

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (`FIRESTORE_EMULATOR_HOST` set). The emulator provides a clean state for
//! each test run; user ids are randomized for isolation within a run.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use stride_tracker::models::{Challenge, CompletedWalk, UserProgress, WalkSession};
use stride_tracker::services::{ChallengeService, ProgressionService, WalkProcessor};
use stride_tracker::time_utils::DateSource;
use tower::ServiceExt;

mod common;
use common::{create_test_app_with_db, test_db};

/// Unique user id for test isolation.
fn unique_user_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
}

/// Build a persisted-walk fixture by running a real session to completion.
fn test_walk(user_id: &str, leg_degrees: f64) -> CompletedWalk {
    let mut session = WalkSession::new(user_id);
    session.start(1_700_000_000_000).unwrap();
    for (i, lat_offset) in [0.0, leg_degrees, 2.0 * leg_degrees].iter().enumerate() {
        let sample = stride_tracker::models::LocationSample::new(
            37.0 + lat_offset,
            -122.0,
            1_700_000_000_000 + i as i64 * 1000,
        );
        assert!(session.push_sample(sample, 1_700_000_000_000 + i as i64 * 1000));
    }
    session.stop(1_700_000_600_000).unwrap();
    CompletedWalk::from_session(&session, chrono::Utc::now()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// USER PROFILES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_profile_roundtrip() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("profile");

    let before = db.get_user(&user_id).await.unwrap();
    assert!(before.is_none(), "User should not exist before creation");

    let user = stride_tracker::models::User {
        user_id: user_id.clone(),
        display_name: "Test Walker".to_string(),
        created_at: "2026-08-20T10:00:00Z".to_string(),
        last_active: "2026-08-20T10:00:00Z".to_string(),
    };
    db.upsert_user(&user).await.unwrap();

    let stored = db.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Test Walker");
}

// ═══════════════════════════════════════════════════════════════════════════
// WALK PERSISTENCE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_walk_save_list_delete() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("walks");

    let walk = test_walk(&user_id, 0.001);
    let walk_id = db.save_walk(&walk).await.unwrap();
    assert_eq!(walk_id, walk.id);

    let listed = db.get_walks_for_user(&user_id, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, walk.id);
    assert!(listed[0].distance_meters > 0.0);

    db.delete_walk(&walk.id).await.unwrap();
    let after = db.get_walks_for_user(&user_id, 10).await.unwrap();
    assert!(after.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// PROGRESSION PIPELINE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_completed_walk_drives_progression() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("pipeline");
    let dates = DateSource::fixed(test_date());

    let progression = ProgressionService::new(db.clone(), dates);
    let challenges = ChallengeService::new(db.clone(), dates);
    let processor = WalkProcessor::new(db.clone(), progression.clone(), challenges.clone());

    // Issue today's challenges first so the walk can contribute to them
    let issued = challenges.generate_daily_challenges(&user_id).await.unwrap();
    assert_eq!(issued.len(), 3);

    // ~2.2 km walk (two 0.01-degree legs north)
    let walk = test_walk(&user_id, 0.01);
    assert!(walk.distance_meters > 2000.0);

    let outcome = processor.process_completed_walk(&walk).await.unwrap();

    // Distance XP: round(km * 10)
    let expected_xp = (walk.distance_meters / 1000.0 * 10.0).round() as u64;
    assert_eq!(outcome.xp_awarded, expected_xp);
    assert_eq!(outcome.streak.daily_streak, 1);

    // The 1 km challenge is completed by a 2+ km walk, with its bonus XP
    let completed: Vec<&Challenge> =
        outcome.challenges.iter().filter(|c| c.completed).collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].reward.amount, 25);

    // Persisted record reflects walk totals, distance XP, and the bonus
    let progress: UserProgress = progression.get_progress(&user_id).await.unwrap();
    assert_eq!(progress.total_walks, 1);
    assert!(progress.total_distance_meters > 2000.0);
    assert_eq!(progress.xp, expected_xp + 25);
}

#[tokio::test]
async fn test_streak_extends_only_once_per_day() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("streak");
    let progression = ProgressionService::new(db.clone(), DateSource::fixed(test_date()));

    let (streak, _) = progression.record_daily_activity(&user_id).await.unwrap();
    assert_eq!(streak.daily_streak, 1);

    // Second walk the same day is a no-op for the streak
    let (streak, _) = progression.record_daily_activity(&user_id).await.unwrap();
    assert_eq!(streak.daily_streak, 1);

    // Next calendar day extends
    let next_day = ProgressionService::new(
        db.clone(),
        DateSource::fixed(test_date().succ_opt().unwrap()),
    );
    let (streak, _) = next_day.record_daily_activity(&user_id).await.unwrap();
    assert_eq!(streak.daily_streak, 2);
}

#[tokio::test]
async fn test_freeze_card_not_usable_without_cards() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("freeze");
    let progression = ProgressionService::new(db.clone(), DateSource::fixed(test_date()));

    progression.record_daily_activity(&user_id).await.unwrap();

    // Two days later with zero cards: nothing to spend
    let later = ProgressionService::new(
        db.clone(),
        DateSource::fixed(test_date() + chrono::Days::new(2)),
    );
    let (streak, used) = later.use_freeze_card(&user_id).await.unwrap();
    assert!(!used);
    assert_eq!(streak.freeze_cards_available, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// CHALLENGES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_daily_challenge_generation_is_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("challenges");
    let challenges = ChallengeService::new(db.clone(), DateSource::fixed(test_date()));

    let first = challenges.generate_daily_challenges(&user_id).await.unwrap();
    assert_eq!(first.len(), 3);

    // Same day, same set: no duplicates issued
    let second = challenges.generate_daily_challenges(&user_id).await.unwrap();
    assert_eq!(second.len(), 3);

    let mut first_ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
    let mut second_ids: Vec<&str> = second.iter().map(|c| c.id.as_str()).collect();
    first_ids.sort_unstable();
    second_ids.sort_unstable();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn test_concurrent_first_requests_issue_one_challenge_set() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("concurrent");
    let (app, _state) = create_test_app_with_db(db.clone());

    let request = |app: axum::Router| {
        let uri = "/api/challenges";
        let user = user_id.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("X-User-Id", user)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    // Two racing first-of-day calls: the per-user lock serializes them, so
    // the second sees the set the first created.
    let (first, second) = tokio::join!(request(app.clone()), request(app.clone()));
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let today = chrono::Utc::now().date_naive();
    let stored = db.get_challenges_for_date(&user_id, today).await.unwrap();
    assert_eq!(stored.len(), 3, "exactly one set of 3 challenges per day");
}

#[tokio::test]
async fn test_challenge_reward_granted_once() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id("reward");
    let dates = DateSource::fixed(test_date());
    let challenges = ChallengeService::new(db.clone(), dates);
    let progression = ProgressionService::new(db.clone(), dates);

    let issued = challenges.generate_daily_challenges(&user_id).await.unwrap();
    let target = &issued[0];

    // Complete it
    let updated = challenges
        .update_challenge_progress(&user_id, &target.id, 100.0)
        .await
        .unwrap()
        .unwrap();
    assert!(updated.completed);

    let xp_after_first = progression.get_progress(&user_id).await.unwrap().xp;
    assert_eq!(xp_after_first, target.reward.amount);

    // Reporting completion again changes nothing
    let again = challenges
        .update_challenge_progress(&user_id, &target.id, 100.0)
        .await
        .unwrap()
        .unwrap();
    assert!(again.completed);

    let xp_after_second = progression.get_progress(&user_id).await.unwrap().xp;
    assert_eq!(xp_after_second, xp_after_first);
}
