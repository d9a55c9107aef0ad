//! # Simulation
//!
//! A simulated boat implementing the [`Platform`](crate::platform::Platform) traits, and a
//! simulated shore station which talks to the boat over a loopback transport. Together they allow
//! the whole boat stack to run without any hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod boat;
mod shore;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use boat::{HullParams, SimBoat};
pub use shore::SimShore;
