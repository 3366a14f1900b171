// SPDX-License-Identifier: MIT

//! Live walk session state machine.
//!
//! A [`WalkSession`] is the canonical in-memory record of one recorded walk.
//! It is owned exclusively by the session controller task for its lifetime;
//! everything here is pure state-machine logic driven by wall-clock
//! milliseconds passed in by the caller, so it can be tested without timers.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Active -> (Paused <-> Active) -> Stopped (terminal)
//! ```

use crate::geometry;
use crate::models::LocationSample;
use serde::{Deserialize, Serialize};

/// Calories burned per kilometer walked (fixed linear estimate).
const CALORIES_PER_KM: f64 = 60.0;

/// Lifecycle status of a walk session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkStatus {
    Idle,
    Active,
    Paused,
    /// Terminal; stats are frozen at their final values.
    Stopped,
}

/// Rejected state transition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} while session is {status:?}")]
    InvalidState {
        action: &'static str,
        status: WalkStatus,
    },
}

/// Live walk session state plus derived stats.
///
/// Derived fields are recomputed on every mutation so any published snapshot
/// is internally consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkSession {
    pub user_id: String,
    pub status: WalkStatus,
    /// Epoch ms when the session became Active (None while Idle).
    pub started_at_ms: Option<i64>,
    /// Epoch ms when the current pause began (None unless Paused).
    pub pause_started_at_ms: Option<i64>,
    /// Accumulated duration of completed pauses, in ms.
    pub total_paused_ms: i64,
    /// Ordered GPS fixes; append-only while Active.
    pub samples: Vec<LocationSample>,
    /// Cumulative path distance in meters. Non-decreasing for the lifetime
    /// of the session.
    pub distance_meters: f64,
    /// now − start − completed pauses (0 while Idle, ≥ 0 always).
    pub elapsed_ms: i64,
    /// Elapsed minus the in-progress pause, when Paused.
    pub active_ms: i64,
    pub average_speed_kmh: f64,
    pub calories_burned: f64,
    pub point_count: usize,
    /// Non-fatal warning surfaced to the UI (e.g. GPS capability lost).
    pub warning: Option<String>,
}

impl WalkSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            status: WalkStatus::Idle,
            started_at_ms: None,
            pause_started_at_ms: None,
            total_paused_ms: 0,
            samples: Vec::new(),
            distance_meters: 0.0,
            elapsed_ms: 0,
            active_ms: 0,
            average_speed_kmh: 0.0,
            calories_burned: 0.0,
            point_count: 0,
            warning: None,
        }
    }

    /// Idle → Active. Clears samples and pause accumulators.
    pub fn start(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        match self.status {
            WalkStatus::Idle => {
                self.status = WalkStatus::Active;
                self.started_at_ms = Some(now_ms);
                self.pause_started_at_ms = None;
                self.total_paused_ms = 0;
                self.samples.clear();
                self.distance_meters = 0.0;
                self.warning = None;
                self.recompute_times(now_ms);
                Ok(())
            }
            status => Err(TransitionError::InvalidState {
                action: "start",
                status,
            }),
        }
    }

    /// Active → Paused.
    pub fn pause(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        match self.status {
            WalkStatus::Active => {
                self.status = WalkStatus::Paused;
                self.pause_started_at_ms = Some(now_ms);
                self.recompute_times(now_ms);
                Ok(())
            }
            status => Err(TransitionError::InvalidState {
                action: "pause",
                status,
            }),
        }
    }

    /// Paused → Active. Folds the finished pause into `total_paused_ms`.
    pub fn resume(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        match self.status {
            WalkStatus::Paused => {
                if let Some(pause_start) = self.pause_started_at_ms.take() {
                    self.total_paused_ms += (now_ms - pause_start).max(0);
                }
                self.status = WalkStatus::Active;
                self.recompute_times(now_ms);
                Ok(())
            }
            status => Err(TransitionError::InvalidState {
                action: "resume",
                status,
            }),
        }
    }

    /// Active|Paused → Stopped (terminal). Stats are frozen at their final
    /// values; an in-progress pause is folded in first.
    pub fn stop(&mut self, now_ms: i64) -> Result<(), TransitionError> {
        match self.status {
            WalkStatus::Active | WalkStatus::Paused => {
                if let Some(pause_start) = self.pause_started_at_ms.take() {
                    self.total_paused_ms += (now_ms - pause_start).max(0);
                }
                self.recompute_times(now_ms);
                self.status = WalkStatus::Stopped;
                Ok(())
            }
            status => Err(TransitionError::InvalidState {
                action: "stop",
                status,
            }),
        }
    }

    /// Append a GPS fix and update the cumulative distance incrementally.
    ///
    /// Samples are only accepted while Active; fixes delivered in any other
    /// state are dropped (returns whether the sample was appended).
    pub fn push_sample(&mut self, sample: LocationSample, now_ms: i64) -> bool {
        if self.status != WalkStatus::Active {
            return false;
        }

        if let Some(last) = self.samples.last() {
            self.distance_meters += geometry::haversine_distance(last, &sample);
        }
        self.samples.push(sample);
        self.recompute_times(now_ms);
        true
    }

    /// Recompute time-derived stats against the given wall clock.
    ///
    /// Driven both by sample arrival and by the controller's 1-second
    /// ticker, so displayed durations advance even without new fixes.
    /// No-op once Stopped.
    pub fn recompute_times(&mut self, now_ms: i64) {
        if self.status == WalkStatus::Stopped {
            return;
        }

        let Some(started_at) = self.started_at_ms else {
            self.elapsed_ms = 0;
            self.active_ms = 0;
            return;
        };

        self.elapsed_ms = (now_ms - started_at - self.total_paused_ms).max(0);

        let in_progress_pause_ms = match self.pause_started_at_ms {
            Some(pause_start) if self.status == WalkStatus::Paused => {
                (now_ms - pause_start).max(0)
            }
            _ => 0,
        };
        self.active_ms = (self.elapsed_ms - in_progress_pause_ms).max(0);

        let km = self.distance_meters / 1000.0;
        let hours = self.active_ms as f64 / 3_600_000.0;
        self.average_speed_kmh = if hours > 0.0 { km / hours } else { 0.0 };
        self.calories_burned = km * CALORIES_PER_KM;
        self.point_count = self.samples.len();
    }
}

/// Outcome of reconciling a UI-originated snapshot against canonical state.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncDecision {
    /// Canonical state is at least as advanced; ignore the snapshot.
    KeepCanonical,
    /// The snapshot represents state the controller has not seen yet
    /// (UI-composed session from before binding completed).
    AdoptIncoming,
    /// The UI stopped the session; a UI stop always wins.
    StopRequested,
}

/// Decide how a UI snapshot merges into the canonical session.
///
/// The controller is the single source of truth once a session is Active;
/// the UI mirror only ever advances the canonical state, never rewinds it.
/// In particular a stale "tracking" snapshot taken before a
/// controller-initiated auto-pause must not resurrect tracking.
pub fn merge_snapshot(canonical: &WalkSession, incoming: &WalkSession) -> SyncDecision {
    // A UI-initiated stop always wins.
    if incoming.status == WalkStatus::Stopped && canonical.status != WalkStatus::Stopped {
        return SyncDecision::StopRequested;
    }

    // Before the controller owns a session, adopt the UI's transient state.
    if canonical.status == WalkStatus::Idle
        && matches!(incoming.status, WalkStatus::Active | WalkStatus::Paused)
    {
        return SyncDecision::AdoptIncoming;
    }

    // Same live session: only a strictly longer sample sequence is "more
    // advanced". Status alone never un-pauses the canonical owner, and a
    // Stopped canonical is terminal: buffered UI fixes from before the stop
    // must not bring the session back. Only a fresh `start` resets it.
    if matches!(canonical.status, WalkStatus::Active | WalkStatus::Paused)
        && canonical.started_at_ms == incoming.started_at_ms
        && incoming.point_count > canonical.point_count
    {
        return SyncDecision::AdoptIncoming;
    }

    SyncDecision::KeepCanonical
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn sample(lat: f64, lon: f64, ts: i64) -> LocationSample {
        LocationSample::new(lat, lon, ts)
    }

    fn active_session() -> WalkSession {
        let mut session = WalkSession::new("u1");
        session.start(T0).unwrap();
        session
    }

    #[test]
    fn test_start_resets_state() {
        let mut session = active_session();
        assert_eq!(session.status, WalkStatus::Active);
        assert_eq!(session.started_at_ms, Some(T0));
        assert_eq!(session.distance_meters, 0.0);
        assert_eq!(session.elapsed_ms, 0);
        assert!(session.samples.is_empty());
    }

    #[test]
    fn test_start_requires_idle() {
        let mut session = active_session();
        assert!(matches!(
            session.start(T0 + 1000),
            Err(TransitionError::InvalidState { action: "start", .. })
        ));
    }

    #[test]
    fn test_samples_dropped_unless_active() {
        let mut session = WalkSession::new("u1");
        assert!(!session.push_sample(sample(37.0, -122.0, T0), T0));
        assert_eq!(session.point_count, 0);

        session.start(T0).unwrap();
        assert!(session.push_sample(sample(37.0, -122.0, T0), T0));

        session.pause(T0 + 1000).unwrap();
        assert!(!session.push_sample(sample(37.001, -122.0, T0 + 2000), T0 + 2000));
        assert_eq!(session.point_count, 1);
    }

    #[test]
    fn test_distance_is_non_decreasing() {
        let mut session = active_session();
        let mut previous = 0.0;
        for i in 0..5 {
            let ts = T0 + i * 1000;
            session.push_sample(sample(37.0 + 0.0001 * i as f64, -122.0, ts), ts);
            assert!(session.distance_meters >= previous);
            previous = session.distance_meters;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_pause_resume_accounting() {
        let mut session = active_session();
        session.pause(T0 + 10_000).unwrap();

        // While paused: elapsed keeps growing, active time is frozen.
        session.recompute_times(T0 + 15_000);
        assert_eq!(session.elapsed_ms, 15_000);
        assert_eq!(session.active_ms, 10_000);

        session.resume(T0 + 20_000).unwrap();
        assert_eq!(session.total_paused_ms, 10_000);
        assert_eq!(session.elapsed_ms, 10_000);
        assert_eq!(session.active_ms, 10_000);
    }

    #[test]
    fn test_stop_freezes_stats() {
        let mut session = active_session();
        session.push_sample(sample(37.0, -122.0, T0), T0);
        session.push_sample(sample(37.001, -122.0, T0 + 5000), T0 + 5000);
        session.stop(T0 + 10_000).unwrap();

        let frozen_elapsed = session.elapsed_ms;
        let frozen_distance = session.distance_meters;

        session.recompute_times(T0 + 60_000);
        assert_eq!(session.elapsed_ms, frozen_elapsed);
        assert_eq!(session.distance_meters, frozen_distance);

        // Terminal: no transition leaves Stopped.
        assert!(session.stop(T0 + 60_000).is_err());
        assert!(session.resume(T0 + 60_000).is_err());
        assert!(session.start(T0 + 60_000).is_err());
    }

    #[test]
    fn test_stop_while_paused_folds_pause() {
        let mut session = active_session();
        session.pause(T0 + 10_000).unwrap();
        session.stop(T0 + 25_000).unwrap();

        assert_eq!(session.total_paused_ms, 15_000);
        assert_eq!(session.elapsed_ms, 10_000);
        assert_eq!(session.active_ms, 10_000);
    }

    #[test]
    fn test_speed_guarded_against_zero_active_time() {
        let mut session = active_session();
        session.recompute_times(T0);
        assert_eq!(session.average_speed_kmh, 0.0);
    }

    #[test]
    fn test_derived_speed_and_calories() {
        let mut session = active_session();
        // 1 km walked over 30 minutes of active time.
        session.distance_meters = 1000.0;
        session.recompute_times(T0 + 1_800_000);

        assert!((session.average_speed_kmh - 2.0).abs() < 1e-9);
        assert!((session.calories_burned - 60.0).abs() < 1e-9);
    }

    // ── Snapshot merge ───────────────────────────────────────────────

    #[test]
    fn test_merge_ui_stop_wins() {
        let canonical = active_session();
        let mut incoming = canonical.clone();
        incoming.stop(T0 + 5000).unwrap();

        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::StopRequested
        );
    }

    #[test]
    fn test_merge_idle_adopts_ui_session() {
        let canonical = WalkSession::new("u1");
        let incoming = active_session();

        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::AdoptIncoming
        );
    }

    #[test]
    fn test_merge_stale_tracking_snapshot_ignored() {
        // Controller auto-paused; an older "still tracking" UI snapshot must
        // not resurrect tracking.
        let mut canonical = active_session();
        let incoming = canonical.clone();
        canonical.pause(T0 + 5000).unwrap();

        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::KeepCanonical
        );
    }

    #[test]
    fn test_merge_longer_sample_sequence_advances() {
        let canonical = active_session();
        let mut incoming = canonical.clone();
        incoming.push_sample(sample(37.0, -122.0, T0 + 1000), T0 + 1000);

        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::AdoptIncoming
        );
    }

    #[test]
    fn test_merge_stopped_canonical_is_final() {
        let mut canonical = active_session();
        canonical.stop(T0 + 1000).unwrap();
        let incoming = active_session();

        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::KeepCanonical
        );
    }

    #[test]
    fn test_merge_stopped_ignores_buffered_ui_fixes() {
        // An Active UI snapshot of the same session with fixes the
        // controller never saw must not resurrect a stopped session.
        let mut canonical = active_session();
        let mut incoming = canonical.clone();
        incoming.push_sample(sample(37.0, -122.0, T0 + 1000), T0 + 1000);
        incoming.push_sample(sample(37.001, -122.0, T0 + 2000), T0 + 2000);
        canonical.stop(T0 + 1500).unwrap();

        assert!(incoming.point_count > canonical.point_count);
        assert_eq!(
            merge_snapshot(&canonical, &incoming),
            SyncDecision::KeepCanonical
        );
    }
}
