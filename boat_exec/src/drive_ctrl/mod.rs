//! # Drive control module
//!
//! Drive control turns speed and heading demands into pulse widths for the two motors and the
//! rudder. While tracking a heading the rudder is driven by a PD law on the heading error, with a
//! bang-bang override at low speed where a partial rudder can't overcome the hull's drag.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use cmd::*;
pub use params::Params;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during drive control.
#[derive(Debug, thiserror::Error)]
pub enum DriveCtrlError {
    #[error("Could not create the drive control archives: {0}")]
    ArchiveError(String),

    #[error("Could not load the drive control parameters: {0}")]
    ParamsError(util::params::LoadError)
}
