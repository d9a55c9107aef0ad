//! # Boat library.
//!
//! This library holds the modules of the AtLAs boat executable, so that they can be tested and
//! driven by other crates in the workspace.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Drive control - converts speed and heading demands into motor and rudder pulses
pub mod drive_ctrl;

/// Mission control - the top level state machine deciding what the boat is doing
pub mod mission;

/// Navigation - coordinate frames and waypoint tracking
pub mod nav;

/// Parameters for the executable itself
pub mod params;

/// Interfaces to the boat's hardware
pub mod platform;

/// Simulated boat hardware
pub mod sim;

/// Millisecond timers with sticky expiry flags
pub mod timer;
