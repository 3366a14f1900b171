// SPDX-License-Identifier: MIT

//! Stride-Tracker: GPS walk tracking with session ownership and progression
//!
//! This crate provides the backend for recording GPS walk sessions (with
//! background ownership of the live session state) and the progression
//! engine layered on top: XP and levels, daily streaks with freeze cards,
//! daily challenges, and leaderboards.

pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ChallengeService, ProgressionService, WalkProcessor};
use session::SessionRegistry;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionRegistry,
    pub walks: WalkProcessor,
    pub progression: ProgressionService,
    pub challenges: ChallengeService,
}
