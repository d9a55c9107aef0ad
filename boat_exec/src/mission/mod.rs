//! # Mission control module
//!
//! Mission control is the top level state machine of the boat. It waits for the shore to provide
//! the origin of the local frame, keeps the boat on its station, runs rescues when the shore asks
//! for them, and hands control to the human operator whenever anything goes wrong or the operator
//! takes the RC transmitter.
//!
//! Each call to [`Mission::step`] performs one cycle:
//!
//! 1. A fresh [`MissionEvent`] is built from the previous navigation step, the receiver monitor,
//!    and at most one inbound message.
//! 2. Background tasks run: sensor polling, link retries, navigation, drive control, and the
//!    periodic telemetry.
//! 3. The current state is dispatched.
//! 4. The cross-cutting rules (return to station, rescue, set station, override, reset) are
//!    applied in that order.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod event;
mod params;
mod state;

#[cfg(test)]
mod test;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use event::*;
pub use params::Params;
pub use state::*;

use serde::Serialize;

use crate::{nav::LocalCoordinate, platform::PlatformError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Top level states of the mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissionState {
    /// Waiting for the shore to provide the geocentric origin
    SetOrigin,

    /// Choosing the station
    SetStation,

    StationKeep(StationKeepMode),

    /// The human operator has control
    Override,

    Rescue(RescueMode)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StationKeepMode {
    /// Navigating back to the station
    Return,

    /// Holding at the station, checking for drift
    Idle
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RescueMode {
    /// Navigating to the target
    Goto,

    /// Looking for the person at the target
    Search,

    /// Holding at the target while the person is helped aboard
    Support
}

/// Where the station comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StationSource {
    /// A coordinate sent by the shore
    Explicit(LocalCoordinate),

    /// The boat's position when the station is set
    CurrentFix
}

/// Errors which stop the mission from running.
///
/// Mission level errors such as a missing origin are not represented here, they are reported to
/// the shore and handled by handing control to the operator.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("Fatal hardware error: {0}")]
    Fatal(PlatformError),

    #[error("Could not create the mission archives: {0}")]
    ArchiveError(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MissionState {
    pub fn name(&self) -> &'static str {
        match self {
            MissionState::SetOrigin => "SetOrigin",
            MissionState::SetStation => "SetStation",
            MissionState::StationKeep(StationKeepMode::Return) => "StationKeep.Return",
            MissionState::StationKeep(StationKeepMode::Idle) => "StationKeep.Idle",
            MissionState::Override => "Override",
            MissionState::Rescue(RescueMode::Goto) => "Rescue.Goto",
            MissionState::Rescue(RescueMode::Search) => "Rescue.Search",
            MissionState::Rescue(RescueMode::Support) => "Rescue.Support"
        }
    }

    pub fn is_rescue(&self) -> bool {
        matches!(self, MissionState::Rescue(_))
    }
}

impl std::fmt::Display for MissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
