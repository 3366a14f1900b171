// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! The opaque persistence gateway of the core: read/write of users, walks,
//! progression records, and challenges. Success/failure only; callers must
//! tolerate last-writer-wins (no cross-request transactions are promised).

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Challenge, CompletedWalk, User, UserProgress};
use crate::services::leaderboard::LeaderboardMetric;
use chrono::NaiveDate;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Walk Operations ─────────────────────────────────────────

    /// Store a completed walk. Returns the walk ID.
    pub async fn save_walk(&self, walk: &CompletedWalk) -> Result<String, AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WALKS)
            .document_id(&walk.id)
            .object(walk)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(walk.id.clone())
    }

    /// Get a walk by ID.
    pub async fn get_walk(&self, walk_id: &str) -> Result<Option<CompletedWalk>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WALKS)
            .obj()
            .one(walk_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's walks, most recent first.
    pub async fn get_walks_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<CompletedWalk>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WALKS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([("timestamp", firestore::FirestoreQueryDirection::Descending)])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a walk.
    pub async fn delete_walk(&self, walk_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WALKS)
            .document_id(walk_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Progression Operations ──────────────────────────────────

    /// Get a user's progression record.
    pub async fn get_user_progress(
        &self,
        user_id: &str,
    ) -> Result<Option<UserProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_PROGRESS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a user's progression record (whole-record replacement).
    pub async fn set_user_progress(&self, progress: &UserProgress) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_PROGRESS)
            .document_id(&progress.user_id)
            .object(progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Top progression records, ordered descending by the metric field.
    pub async fn get_leaderboard_snapshot(
        &self,
        metric: LeaderboardMetric,
        limit: u32,
    ) -> Result<Vec<UserProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USER_PROGRESS)
            .order_by([(
                metric.field_name(),
                firestore::FirestoreQueryDirection::Descending,
            )])
            .limit(limit)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// Get a challenge by ID.
    pub async fn get_challenge(&self, challenge_id: &str) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CHALLENGES)
            .obj()
            .one(challenge_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's challenges for one calendar day.
    pub async fn get_challenges_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Challenge>, AppError> {
        let user_id = user_id.to_string();
        let date = date.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("assigned_date").eq(date.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a challenge.
    pub async fn set_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CHALLENGES)
            .document_id(&challenge.id)
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Store multiple challenges with bounded concurrency.
    pub async fn batch_set_challenges(&self, challenges: &[Challenge]) -> Result<(), AppError> {
        let client = self.get_client()?;

        stream::iter(challenges.to_vec())
            .map(|challenge| async move {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::CHALLENGES)
                    .document_id(&challenge.id)
                    .object(&challenge)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }
}
