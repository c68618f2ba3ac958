//! Poll state for one monitoring session.
//!
//! Two independent flags drive the state:
//! - `active`: the automatic timer is scheduled (`start` / `stop`)
//! - `loading`: at least one fetch is outstanding
//!
//! A failed fetch never blanks the snapshot; the last good readings stay
//! visible next to the error until a later fetch succeeds.

use crate::error::MonitorError;
use crate::snapshot::ReadingSnapshot;
use serde::Serialize;
use std::time::SystemTime;

/// Observable state of a polling session.
#[derive(Debug, Clone, Serialize)]
pub struct PollState {
    /// Last successfully fetched readings.
    pub snapshot: ReadingSnapshot,
    /// True while at least one fetch is outstanding.
    pub loading: bool,
    /// True until the first fetch settles.
    pub initial_load: bool,
    /// Cause of the most recent failure, cleared by the next success.
    pub error: Option<MonitorError>,
    /// Wall-clock time of the last successful fetch.
    #[serde(with = "rfc3339_opt")]
    pub last_update: Option<SystemTime>,
    /// True while the automatic timer is scheduled.
    pub active: bool,
    /// Successful fetches since the session started.
    pub success_count: u64,
    /// Failed fetches since the session started.
    pub failure_count: u64,
    #[serde(skip)]
    in_flight: usize,
}

impl PollState {
    /// Create the initial state.
    #[must_use]
    pub fn new(active: bool) -> Self {
        Self {
            snapshot: ReadingSnapshot::default(),
            loading: false,
            initial_load: true,
            error: None,
            last_update: None,
            active,
            success_count: 0,
            failure_count: 0,
            in_flight: 0,
        }
    }

    /// Number of outstanding fetches.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Record that a fetch has been issued.
    pub fn begin_fetch(&mut self) {
        self.in_flight += 1;
        self.loading = true;
    }

    /// Record that a fetch has settled, whatever its outcome.
    pub fn end_fetch(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.loading = self.in_flight > 0;
        self.initial_load = false;
    }

    /// Apply a successful fetch.
    pub fn apply_success(&mut self, snapshot: ReadingSnapshot, at: SystemTime) {
        self.snapshot = snapshot;
        self.error = None;
        self.last_update = Some(at);
        self.success_count += 1;
    }

    /// Apply a failed fetch, keeping the previous snapshot.
    pub fn apply_failure(&mut self, error: MonitorError) {
        self.error = Some(error);
        self.failure_count += 1;
    }

    /// Record a configuration failure detected before any fetch was issued.
    pub fn reject(&mut self, error: MonitorError) {
        self.apply_failure(error);
        self.initial_load = false;
    }

    /// Set the timer flag.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Serde helper for `Option<SystemTime>` as an RFC 3339 string.
mod rfc3339_opt {
    use serde::Serializer;
    use std::time::SystemTime;

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&humantime::format_rfc3339_millis(*t).to_string()),
            None => serializer.serialize_none(),
        }
    }
}
