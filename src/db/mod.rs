// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const WALKS: &str = "walks";
    /// Progression records (keyed by user_id)
    pub const USER_PROGRESS: &str = "user_progress";
    pub const CHALLENGES: &str = "challenges";
}
