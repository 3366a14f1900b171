// SPDX-License-Identifier: MIT

//! Live walk-session ownership: feed abstraction, controller actor, and the
//! per-user registry.

pub mod controller;
pub mod feed;
pub mod registry;

pub use controller::{SessionError, StopOutcome, SyncResponse, WalkSessionHandle};
pub use feed::{CapabilityState, FeedError, LocationFeed, PushLocationFeed};
pub use registry::SessionRegistry;
