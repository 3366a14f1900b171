// SPDX-License-Identifier: MIT

//! Walk session controller.
//!
//! One controller task per user owns the canonical [`WalkSession`]. All
//! mutation happens on that task, so location samples, the 1-second ticker,
//! and commands are serialized against each other by construction. The UI
//! domain talks to it through a [`WalkSessionHandle`]: a command channel plus
//! a read-only `watch` stream of session snapshots.
//!
//! Subscription cancellation is by dropping the broadcast receiver: after
//! `pause`, `stop`, or capability loss the receiver is dropped, so no sample
//! can be processed late. Capability signals travel on a separate watch
//! channel and therefore still reach the controller while sample delivery is
//! cancelled.

use crate::models::session::TransitionError;
use crate::models::walk::WalkBuildError;
use crate::models::{merge_snapshot, CompletedWalk, LocationSample, SyncDecision, WalkSession, WalkStatus};
use crate::session::feed::LocationFeed;
use crate::time_utils::now_epoch_ms;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Result of stopping a session.
#[derive(Debug)]
pub enum StopOutcome {
    /// Final distance was below the persistence threshold; the session is
    /// discarded and no walk record is produced.
    Discarded { distance_meters: f64 },
    /// The session produced a walk record for persistence.
    Completed(Box<CompletedWalk>),
}

/// Response to a `sync` command: the canonical state after merging, plus a
/// stop outcome when the snapshot carried a UI-initiated stop.
#[derive(Debug)]
pub struct SyncResponse {
    pub session: WalkSession,
    pub stop_outcome: Option<StopOutcome>,
}

/// Errors from session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    WalkBuild(#[from] WalkBuildError),

    #[error("session controller is not running")]
    ControllerGone,
}

enum Command {
    Start(oneshot::Sender<Result<WalkSession, SessionError>>),
    Pause(oneshot::Sender<Result<WalkSession, SessionError>>),
    Resume(oneshot::Sender<Result<WalkSession, SessionError>>),
    Stop(oneshot::Sender<Result<StopOutcome, SessionError>>),
    Sync(
        Box<WalkSession>,
        oneshot::Sender<Result<SyncResponse, SessionError>>,
    ),
}

/// Cloneable handle to a running session controller.
#[derive(Clone)]
pub struct WalkSessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<WalkSession>,
}

impl WalkSessionHandle {
    pub async fn start(&self) -> Result<WalkSession, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Start(tx), rx).await
    }

    pub async fn pause(&self) -> Result<WalkSession, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Pause(tx), rx).await
    }

    pub async fn resume(&self) -> Result<WalkSession, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Resume(tx), rx).await
    }

    pub async fn stop(&self) -> Result<StopOutcome, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(tx), rx).await
    }

    /// Reconcile a UI-originated snapshot with the canonical state.
    pub async fn sync(&self, snapshot: WalkSession) -> Result<SyncResponse, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Sync(Box::new(snapshot), tx), rx).await
    }

    /// Current canonical snapshot (poll fallback for the UI).
    pub fn snapshot(&self) -> WalkSession {
        self.state.borrow().clone()
    }

    /// Subscribe to the canonical snapshot stream.
    pub fn subscribe(&self) -> watch::Receiver<WalkSession> {
        self.state.clone()
    }

    async fn send<T>(
        &self,
        command: Command,
        rx: oneshot::Receiver<Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::ControllerGone)?;
        rx.await.map_err(|_| SessionError::ControllerGone)?
    }
}

/// Spawn a session controller for one user.
pub fn spawn(
    user_id: impl Into<String>,
    feed: Arc<dyn LocationFeed>,
    min_walk_distance_meters: f64,
) -> WalkSessionHandle {
    let user_id = user_id.into();
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    let (state_tx, state_rx) = watch::channel(WalkSession::new(&user_id));

    tokio::spawn(run(
        user_id,
        feed,
        cmd_rx,
        state_tx,
        min_walk_distance_meters,
    ));

    WalkSessionHandle {
        commands: cmd_tx,
        state: state_rx,
    }
}

async fn run(
    user_id: String,
    feed: Arc<dyn LocationFeed>,
    mut cmd_rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<WalkSession>,
    min_walk_distance_meters: f64,
) {
    let mut session = WalkSession::new(&user_id);
    let mut samples_rx: Option<broadcast::Receiver<LocationSample>> = None;
    let mut capability_rx = feed.capability();
    let mut capability_open = true;
    // A manual pause must not be undone by capability coming back.
    let mut manual_pause = false;
    let mut auto_paused = false;

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                let now = now_epoch_ms();
                match cmd {
                    Command::Start(respond) => {
                        if session.status == WalkStatus::Stopped {
                            // Explicit new start: the one allowed reset.
                            session = WalkSession::new(&user_id);
                        }
                        let result = session.start(now).map(|()| {
                            manual_pause = false;
                            auto_paused = false;
                            samples_rx = Some(feed.subscribe());
                            let capability = capability_rx.borrow().clone();
                            if !capability.available {
                                auto_pause(
                                    &mut session,
                                    &mut samples_rx,
                                    &mut auto_paused,
                                    capability.reason.as_deref().unwrap_or("capability lost"),
                                    now,
                                );
                            }
                            tracing::info!(user_id = %session.user_id, "Walk session started");
                            session.clone()
                        });
                        publish(&state_tx, &session);
                        let _ = respond.send(result.map_err(Into::into));
                    }
                    Command::Pause(respond) => {
                        let result = if session.status == WalkStatus::Paused && auto_paused {
                            // Upgrade an auto-pause to a manual one.
                            auto_paused = false;
                            manual_pause = true;
                            Ok(session.clone())
                        } else {
                            session.pause(now).map(|()| {
                                manual_pause = true;
                                auto_paused = false;
                                samples_rx = None;
                                session.clone()
                            })
                        };
                        publish(&state_tx, &session);
                        let _ = respond.send(result.map_err(Into::into));
                    }
                    Command::Resume(respond) => {
                        let result = session.resume(now).map(|()| {
                            manual_pause = false;
                            auto_paused = false;
                            session.warning = None;
                            samples_rx = Some(feed.subscribe());
                            let capability = capability_rx.borrow().clone();
                            if !capability.available {
                                auto_pause(
                                    &mut session,
                                    &mut samples_rx,
                                    &mut auto_paused,
                                    capability.reason.as_deref().unwrap_or("capability lost"),
                                    now,
                                );
                            }
                            session.clone()
                        });
                        publish(&state_tx, &session);
                        let _ = respond.send(result.map_err(Into::into));
                    }
                    Command::Stop(respond) => {
                        let result = session.stop(now).map_err(SessionError::from).and_then(|()| {
                            samples_rx = None;
                            manual_pause = false;
                            auto_paused = false;
                            build_stop_outcome(&session, min_walk_distance_meters)
                        });
                        publish(&state_tx, &session);
                        let _ = respond.send(result);
                    }
                    Command::Sync(incoming, respond) => {
                        let result = handle_sync(
                            &mut session,
                            *incoming,
                            &mut samples_rx,
                            &mut manual_pause,
                            &mut auto_paused,
                            feed.as_ref(),
                            min_walk_distance_meters,
                            now,
                        );
                        publish(&state_tx, &session);
                        let _ = respond.send(result);
                    }
                }
            }

            sample = next_sample(&mut samples_rx) => {
                match sample {
                    Ok(sample) => {
                        let now = now_epoch_ms();
                        if session.push_sample(sample, now) {
                            publish(&state_tx, &session);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(user_id = %session.user_id, skipped, "Sample stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        samples_rx = None;
                    }
                }
            }

            changed = capability_rx.changed(), if capability_open => {
                if changed.is_err() {
                    capability_open = false;
                    continue;
                }
                let now = now_epoch_ms();
                let capability = capability_rx.borrow().clone();
                if !capability.available {
                    let reason = capability.reason.as_deref().unwrap_or("capability lost");
                    if session.status == WalkStatus::Active {
                        tracing::warn!(user_id = %session.user_id, reason, "Capability lost, auto-pausing");
                        auto_pause(&mut session, &mut samples_rx, &mut auto_paused, reason, now);
                        publish(&state_tx, &session);
                    } else {
                        session.warning = Some(reason.to_string());
                        publish(&state_tx, &session);
                    }
                } else if auto_paused && !manual_pause && session.status == WalkStatus::Paused {
                    tracing::info!(user_id = %session.user_id, "Capability restored, auto-resuming");
                    if session.resume(now).is_ok() {
                        auto_paused = false;
                        session.warning = None;
                        samples_rx = Some(feed.subscribe());
                        publish(&state_tx, &session);
                    }
                } else {
                    session.warning = None;
                    publish(&state_tx, &session);
                }
            }

            _ = ticker.tick(), if matches!(session.status, WalkStatus::Active | WalkStatus::Paused) => {
                session.recompute_times(now_epoch_ms());
                publish(&state_tx, &session);
            }
        }
    }

    tracing::debug!(user_id = %user_id, "Session controller shut down");
}

async fn next_sample(
    rx: &mut Option<broadcast::Receiver<LocationSample>>,
) -> Result<LocationSample, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn publish(state_tx: &watch::Sender<WalkSession>, session: &WalkSession) {
    let _ = state_tx.send(session.clone());
}

fn auto_pause(
    session: &mut WalkSession,
    samples_rx: &mut Option<broadcast::Receiver<LocationSample>>,
    auto_paused: &mut bool,
    reason: &str,
    now: i64,
) {
    if session.pause(now).is_ok() {
        *samples_rx = None;
        *auto_paused = true;
        session.warning = Some(reason.to_string());
    }
}

fn build_stop_outcome(
    session: &WalkSession,
    min_walk_distance_meters: f64,
) -> Result<StopOutcome, SessionError> {
    if session.distance_meters < min_walk_distance_meters {
        Ok(StopOutcome::Discarded {
            distance_meters: session.distance_meters,
        })
    } else {
        let walk = CompletedWalk::from_session(session, chrono::Utc::now())?;
        Ok(StopOutcome::Completed(Box::new(walk)))
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_sync(
    session: &mut WalkSession,
    incoming: WalkSession,
    samples_rx: &mut Option<broadcast::Receiver<LocationSample>>,
    manual_pause: &mut bool,
    auto_paused: &mut bool,
    feed: &dyn LocationFeed,
    min_walk_distance_meters: f64,
    now: i64,
) -> Result<SyncResponse, SessionError> {
    match merge_snapshot(session, &incoming) {
        SyncDecision::KeepCanonical => Ok(SyncResponse {
            session: session.clone(),
            stop_outcome: None,
        }),
        SyncDecision::AdoptIncoming => {
            *session = incoming;
            *auto_paused = false;
            *manual_pause = session.status == WalkStatus::Paused;
            *samples_rx = if session.status == WalkStatus::Active {
                Some(feed.subscribe())
            } else {
                None
            };
            session.recompute_times(now);
            Ok(SyncResponse {
                session: session.clone(),
                stop_outcome: None,
            })
        }
        SyncDecision::StopRequested => {
            // Adopt the UI's (already stopped) session when it carries at
            // least as much data as the canonical one; otherwise stop the
            // canonical state where it is.
            let adopt = session.status == WalkStatus::Idle
                || (session.started_at_ms == incoming.started_at_ms
                    && incoming.point_count >= session.point_count);
            if adopt {
                *session = incoming;
            }
            if session.status != WalkStatus::Stopped {
                session.stop(now)?;
            }
            *samples_rx = None;
            *manual_pause = false;
            *auto_paused = false;
            let outcome = build_stop_outcome(session, min_walk_distance_meters)?;
            Ok(SyncResponse {
                session: session.clone(),
                stop_outcome: Some(outcome),
            })
        }
    }
}
