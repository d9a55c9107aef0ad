//! # Timer table
//!
//! One-shot millisecond timers keyed by [`TimerId`]. Expiry is sticky: once a timer has expired it
//! reports so until it is cleared or started again, so an expiry can't be missed by a state which
//! only checks its timers occasionally.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TimerTable {
    timers: HashMap<TimerId, Timer>
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    deadline_ms: u64,
    running: bool,
    expired: bool
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Every timer used on the boat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Periodic heartbeat to the shore
    Heartbeat,

    /// Periodic barometer report
    Barometer,

    /// Periodic boat position report
    PositionReport,

    /// Station keeping drift check
    DriftCheck,

    /// Limit on waiting for a fix when saving the current position as the station
    StationFix,

    /// Receiver stays online this long after the override line was last triggered
    ReceiverHold,

    /// Shore heartbeat loss detection
    ShoreHeartbeat,

    /// Navigation course update
    NavUpdate,

    /// Geocentric error correction goes stale when this expires
    CorrectionFreshness,

    /// Drive rudder update
    RudderUpdate
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TimerTable {
    /// Start (or restart) a timer which expires `duration_ms` after `now_ms`.
    ///
    /// Any previous expiry of the timer is cleared.
    pub fn new_timer(&mut self, id: TimerId, duration_ms: u64, now_ms: u64) {
        self.timers.insert(id, Timer {
            deadline_ms: now_ms.saturating_add(duration_ms),
            running: true,
            expired: false
        });
    }

    /// Returns true if the timer has expired and not been cleared since.
    pub fn is_expired(&self, id: TimerId) -> bool {
        self.timers.get(&id).map(|t| t.expired).unwrap_or(false)
    }

    /// Returns true if the timer is counting down.
    pub fn is_running(&self, id: TimerId) -> bool {
        self.timers.get(&id).map(|t| t.running).unwrap_or(false)
    }

    /// Stop the timer and clear its expiry.
    pub fn clear(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    /// Stop and clear all timers.
    pub fn clear_all(&mut self) {
        self.timers.clear();
    }

    /// Set the expiry flag of every running timer whose deadline has been reached.
    pub fn tick(&mut self, now_ms: u64) {
        for t in self.timers.values_mut() {
            if t.running && now_ms >= t.deadline_ms {
                t.running = false;
                t.expired = true;
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
