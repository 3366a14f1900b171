// SPDX-License-Identifier: MIT

//! Shared helpers for date/time handling.
//!
//! Streak logic operates on calendar dates, so "today" is obtained through
//! [`DateSource`] rather than `Utc::now()` directly. Tests freeze the date
//! with [`DateSource::fixed`].

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Source of "today" for calendar-date logic.
#[derive(Debug, Clone, Copy)]
pub enum DateSource {
    /// Real UTC calendar date.
    System,
    /// Frozen date, for tests.
    Fixed(NaiveDate),
}

impl DateSource {
    pub fn fixed(date: NaiveDate) -> Self {
        Self::Fixed(date)
    }

    pub fn today(&self) -> NaiveDate {
        match self {
            Self::System => Utc::now().date_naive(),
            Self::Fixed(date) => *date,
        }
    }
}

impl Default for DateSource {
    fn default() -> Self {
        Self::System
    }
}
