//! # Boat Executable Parameters
//!
//! This module provides parameters for the boat executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use comms_if::net::NetParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BoatExecParams {

    /// Minimum level of log records, one of `"info"`, `"debug"` or `"trace"`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Subsystems brought up at boot and serviced in the main loop
    #[serde(default)]
    pub subsystems: Subsystems,

    /// Transport used by the telemetry link
    pub transport: TransportKind,

    /// Network settings, used by the `zmq` transport
    #[serde(default)]
    pub net: NetParams,

    /// Script of shore messages injected over the loopback transport
    pub script_path: Option<String>,

    /// Latitude and longitude of the simulated boat's start position, used with the loopback
    /// transport.
    ///
    /// Units: degrees
    #[serde(default)]
    pub sim_start_lat_lon_deg: [f64; 2]
}

/// Subsystem toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Subsystems {
    pub gps: bool,
    pub drive: bool,
    pub barometer: bool,
    pub tilt_compass: bool,
    pub heartbeat: bool,
    pub position_report: bool
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// In-memory transport driven by the simulated shore
    Loopback,

    /// ZeroMQ socket to a shore station
    Zmq
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Subsystems {
    fn default() -> Self {
        Self {
            gps: true,
            drive: true,
            barometer: true,
            tilt_compass: true,
            heartbeat: true,
            position_report: true
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
