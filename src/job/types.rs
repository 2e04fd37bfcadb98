// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Job state types.
//!
//! # State Transitions
//!
//! ```text
//!              first cycle ok
//!              (or cache fallback ok)
//! Starting ────────────────────────→ Running
//!    │                                  │
//!    │ (construction failed)            │ shutdown() / drop
//!    ↓                                  ↓
//! Stopped ←──────────────────────── ShuttingDown
//!              task finished,
//!              origin closed
//! ```
//!
//! # State Descriptions
//!
//! - **Starting**: Construction protocol in progress. No background task yet.
//! - **Running**: Background task is scheduling refresh cycles.
//! - **ShuttingDown**: Stop signalled. An in-flight cycle may still finish.
//! - **Stopped**: No more cycles will run and the origin has been closed.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lifecycle state of a [`ReplicationJob`](super::ReplicationJob).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Running the construction-time cycle.
    Starting,

    /// Periodic refresh is active.
    Running,

    /// Shutdown signalled, waiting for the background task.
    ShuttingDown,

    /// Background task finished. Safe to drop.
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Starting => write!(f, "Starting"),
            JobState::Running => write!(f, "Running"),
            JobState::ShuttingDown => write!(f, "ShuttingDown"),
            JobState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Last success / last error instants, shared between the cycle task and readers.
///
/// Each field is a single atomic word of epoch millis (0 = never), so a
/// reader can never observe a half-written update.
#[derive(Debug, Default)]
pub(crate) struct StatusCell {
    last_success: AtomicU64,
    last_error: AtomicU64,
}

impl StatusCell {
    pub(crate) fn record_success(&self) {
        self.last_success.store(epoch_millis(), Ordering::Release);
    }

    pub(crate) fn record_error(&self) {
        self.last_error.store(epoch_millis(), Ordering::Release);
    }

    pub(crate) fn since_last_success(&self) -> Option<Duration> {
        elapsed_since(self.last_success.load(Ordering::Acquire))
    }

    pub(crate) fn since_last_error(&self) -> Option<Duration> {
        elapsed_since(self.last_error.load(Ordering::Acquire))
    }
}

fn elapsed_since(millis: u64) -> Option<Duration> {
    if millis == 0 {
        return None;
    }
    Some(Duration::from_millis(epoch_millis().saturating_sub(millis)))
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1)
        .max(1)
}

/// Point-in-time summary of a job, for logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub endpoint: String,
    /// Kind of the configured origin (`bundle`, `file` or `http`).
    pub origin: &'static str,
    pub state: JobState,
    pub refresh_period: Duration,
    pub max_cache_age: Duration,
    pub since_last_success: Option<Duration>,
    pub since_last_error: Option<Duration>,
}

impl JobStatus {
    /// True if the most recent cycle outcome was a success.
    pub fn is_healthy(&self) -> bool {
        match (self.since_last_success, self.since_last_error) {
            (Some(_), None) => true,
            (Some(success), Some(error)) => success <= error,
            (None, _) => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}): refresh every {}, max cache age {}, last success {}, last error {}",
            self.endpoint,
            self.origin,
            self.state,
            humantime::format_duration(self.refresh_period),
            humantime::format_duration(self.max_cache_age),
            Ago(self.since_last_success),
            Ago(self.since_last_error),
        )
    }
}

struct Ago(Option<Duration>);

impl fmt::Display for Ago {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => write!(f, "never"),
            // whole seconds keep the line readable
            Some(d) => write!(f, "{} ago", humantime::format_duration(Duration::from_secs(d.as_secs()))),
        }
    }
}
