//! Parameters structure for drive control

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {

    // ---- RUDDER CONTROL ----

    /// Rudder proportional gain
    ///
    /// Units: degrees of rudder per degree of heading error
    pub k_p: f64,

    /// Rudder derivative gain
    ///
    /// Units: degrees of rudder per degree/second of heading error
    pub k_d: f64,

    /// Period between rudder updates while tracking a heading
    ///
    /// Units: milliseconds
    pub rudder_period_ms: u64,

    /// Rudder angle at full throw
    ///
    /// Units: degrees
    pub max_rudder_deg: f64,

    /// Below this speed large heading errors get the full rudder throw
    ///
    /// Units: percent
    pub bang_bang_speed_pct: f64,

    /// Heading error above which the bang-bang override applies
    ///
    /// Units: degrees
    pub bang_bang_error_deg: f64,

    // ---- PULSE MAPPING ----

    /// Motor pulse at zero speed
    ///
    /// Units: microseconds
    pub motor_stop_us: u16,

    /// Change in motor pulse from zero to full speed
    ///
    /// Units: microseconds
    pub motor_range_us: u16,

    /// Units: microseconds
    pub motor_min_us: u16,

    /// Units: microseconds
    pub motor_max_us: u16,

    /// Rudder pulse when centred
    ///
    /// Units: microseconds
    pub rudder_stop_us: u16,

    /// Change in rudder pulse from centred to full throw
    ///
    /// Units: microseconds
    pub rudder_range_us: u16,

    /// Units: microseconds
    pub rudder_min_us: u16,

    /// Units: microseconds
    pub rudder_max_us: u16
}

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 7.0,
            k_d: 0.0,
            rudder_period_ms: 100,
            max_rudder_deg: 45.0,
            bang_bang_speed_pct: 17.0,
            bang_bang_error_deg: 10.0,
            motor_stop_us: 1500,
            motor_range_us: 500,
            motor_min_us: 1000,
            motor_max_us: 2000,
            rudder_stop_us: 1500,
            rudder_range_us: 400,
            rudder_min_us: 1100,
            rudder_max_us: 1900
        }
    }
}
