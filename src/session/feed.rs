// SPDX-License-Identifier: MIT

//! Location feed abstraction.
//!
//! The controller consumes GPS fixes through [`LocationFeed`], which keeps
//! it independent of where fixes come from (the HTTP ingest route in
//! production, a scripted feed in tests). Samples arrive on a broadcast
//! channel; dropping the receiver is the cancellation contract: once the
//! controller drops its receiver no further samples can reach it.
//! Permission/GPS availability is a separate `watch` channel so capability
//! changes still reach the controller while sample delivery is cancelled.

use crate::models::LocationSample;
use std::sync::RwLock;
use tokio::sync::{broadcast, watch};

/// Sample channel capacity. A ~1 Hz feed never builds a deep backlog.
const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// Permission/GPS availability of the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityState {
    pub available: bool,
    /// Why capability was lost, when it was ("permission revoked",
    /// "gps disabled", ...).
    pub reason: Option<String>,
}

impl CapabilityState {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn lost(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// Feed failures for one-shot location lookups.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("location provider unavailable: {0}")]
    Unavailable(String),

    #[error("no location fix available yet")]
    NoFix,
}

/// A cancellable, permission-gated push source of location samples.
pub trait LocationFeed: Send + Sync {
    /// Subscribe to the sample stream. Dropping the receiver cancels the
    /// subscription.
    fn subscribe(&self) -> broadcast::Receiver<LocationSample>;

    /// Observe permission/GPS availability.
    fn capability(&self) -> watch::Receiver<CapabilityState>;

    /// Most recent known fix, if any.
    fn current_location(&self) -> Result<LocationSample, FeedError>;
}

/// Production feed: the device pushes fixes and capability signals over
/// HTTP and this fans them out to the session controller.
pub struct PushLocationFeed {
    samples_tx: broadcast::Sender<LocationSample>,
    capability_tx: watch::Sender<CapabilityState>,
    capability_rx: watch::Receiver<CapabilityState>,
    last_fix: RwLock<Option<LocationSample>>,
}

impl PushLocationFeed {
    pub fn new() -> Self {
        let (samples_tx, _) = broadcast::channel(SAMPLE_CHANNEL_CAPACITY);
        let (capability_tx, capability_rx) = watch::channel(CapabilityState::available());
        Self {
            samples_tx,
            capability_tx,
            capability_rx,
            last_fix: RwLock::new(None),
        }
    }

    /// Push a device fix into the feed.
    pub fn push_sample(&self, sample: LocationSample) {
        if let Ok(mut last) = self.last_fix.write() {
            *last = Some(sample.clone());
        }
        // No subscriber just means nobody is recording right now.
        let _ = self.samples_tx.send(sample);
    }

    /// Report a capability change from the device.
    pub fn set_capability(&self, state: CapabilityState) {
        self.capability_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl Default for PushLocationFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationFeed for PushLocationFeed {
    fn subscribe(&self) -> broadcast::Receiver<LocationSample> {
        self.samples_tx.subscribe()
    }

    fn capability(&self) -> watch::Receiver<CapabilityState> {
        self.capability_rx.clone()
    }

    fn current_location(&self) -> Result<LocationSample, FeedError> {
        let capability = self.capability_rx.borrow().clone();
        if !capability.available {
            return Err(FeedError::Unavailable(
                capability.reason.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        self.last_fix
            .read()
            .ok()
            .and_then(|last| last.clone())
            .ok_or(FeedError::NoFix)
    }
}
