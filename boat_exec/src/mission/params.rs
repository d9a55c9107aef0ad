//! Parameters structure for mission control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for mission control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- PERIODIC TELEMETRY ----

    /// Units: milliseconds
    pub heartbeat_period_ms: u64,

    /// Units: milliseconds
    pub barometer_period_ms: u64,

    /// Units: milliseconds
    pub position_report_period_ms: u64,

    /// Request acknowledgement of status reports from the shore
    pub ack_status_reports: bool,

    // ---- STATION KEEPING ----

    /// Distance from the station at which the boat is considered back on station.
    ///
    /// Units: meters
    pub station_tolerance_m: f64,

    /// Distance from the station beyond which the boat returns to it.
    ///
    /// Units: meters
    pub station_drift_m: f64,

    /// Units: milliseconds
    pub drift_check_period_ms: u64,

    /// Maximum time to wait for a GPS fix when saving the current position as the station.
    ///
    /// Units: milliseconds
    pub station_fix_timeout_ms: u64,

    // ---- RESCUE ----

    /// Distance from the rescue target at which the boat is considered to have reached it.
    ///
    /// Units: meters
    pub rescue_tolerance_m: f64,

    // ---- MONITORING ----

    /// The receiver is considered online for this long after the override line was last
    /// triggered.
    ///
    /// Units: milliseconds
    pub receiver_hold_ms: u64,

    /// The shore is considered lost if no heartbeat arrives for this long.
    ///
    /// Units: milliseconds
    pub shore_heartbeat_timeout_ms: u64
}

impl Default for Params {
    fn default() -> Self {
        Self {
            heartbeat_period_ms: 3000,
            barometer_period_ms: 10_000,
            position_report_period_ms: 2000,
            ack_status_reports: true,
            station_tolerance_m: 5.0,
            station_drift_m: 12.0,
            drift_check_period_ms: 3000,
            station_fix_timeout_ms: 20_000,
            rescue_tolerance_m: 2.0,
            receiver_hold_ms: 2000,
            shore_heartbeat_timeout_ms: 10_000
        }
    }
}
