// SPDX-License-Identifier: MIT

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (from the auth provider; also used as document ID)
    pub user_id: String,
    /// Display name shown on the leaderboard
    pub display_name: String,
    /// When the user first appeared (ISO 8601)
    pub created_at: String,
    /// Last activity timestamp (ISO 8601)
    pub last_active: String,
}
