// SPDX-License-Identifier: MIT

//! Per-user session registry.
//!
//! One live session controller (and its push feed) per user, created on
//! demand. The controller task outlives any single HTTP request, which is
//! what lets a walk keep recording while the app is backgrounded.

use crate::session::controller::{self, WalkSessionHandle};
use crate::session::feed::{LocationFeed, PushLocationFeed};
use dashmap::DashMap;
use std::sync::Arc;

struct SessionEntry {
    handle: WalkSessionHandle,
    feed: Arc<PushLocationFeed>,
}

/// Registry of live session controllers, keyed by user id.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    min_walk_distance_meters: f64,
}

impl SessionRegistry {
    pub fn new(min_walk_distance_meters: f64) -> Self {
        Self {
            sessions: DashMap::new(),
            min_walk_distance_meters,
        }
    }

    /// Handle for the user's session controller, spawning it if needed.
    pub fn handle(&self, user_id: &str) -> WalkSessionHandle {
        self.entry(user_id, |entry| entry.handle.clone())
    }

    /// The user's push feed (HTTP sample/capability ingest).
    pub fn feed(&self, user_id: &str) -> Arc<PushLocationFeed> {
        self.entry(user_id, |entry| entry.feed.clone())
    }

    fn entry<T>(&self, user_id: &str, select: impl Fn(&SessionEntry) -> T) -> T {
        let entry = self.sessions.entry(user_id.to_string()).or_insert_with(|| {
            let feed = Arc::new(PushLocationFeed::new());
            let handle = controller::spawn(
                user_id,
                feed.clone() as Arc<dyn LocationFeed>,
                self.min_walk_distance_meters,
            );
            SessionEntry { handle, feed }
        });
        select(entry.value())
    }
}
