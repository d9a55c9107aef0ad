//! # Navigation module
//!
//! Navigation keeps track of where the boat is in the local frame of the origin given by the
//! shore, and steers it towards a destination. Once per update period the course to the
//! destination is computed, and a speed proportional to the remaining distance is demanded along
//! the bearing. To stop the rudder chattering the demanded heading only changes when the bearing
//! has moved by more than the hysteresis angle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod coords;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use coords::*;
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur during navigation.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("Cannot navigate without an origin")]
    NoOrigin,

    #[error("The GPS is not ready to navigate")]
    GpsNotReady,

    #[error("Could not create the navigation archives: {0}")]
    ArchiveError(String),

    #[error("Could not load the navigation parameters: {0}")]
    ParamsError(util::params::LoadError)
}
