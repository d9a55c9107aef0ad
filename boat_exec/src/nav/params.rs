//! Parameters structure for navigation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Period between course updates while navigating.
    ///
    /// Units: milliseconds
    pub update_period_ms: u64,

    /// Speed demanded per meter of distance remaining.
    ///
    /// Units: percent/meter
    pub speed_gain_pct_per_m: f64,

    /// Maximum speed demand.
    ///
    /// Units: percent
    pub max_speed_pct: f64,

    /// The demanded heading is only changed when the bearing to the destination differs from it by
    /// more than this.
    ///
    /// Units: degrees
    pub heading_hysteresis_deg: f64,

    /// A geocentric error correction is dropped if no new one arrives within this time.
    ///
    /// Units: milliseconds
    pub correction_freshness_ms: u64,

    /// Apply geocentric error corrections sent by the shore.
    pub use_error_correction: bool
}

impl Default for Params {
    fn default() -> Self {
        Self {
            update_period_ms: 1000,
            speed_gain_pct_per_m: 0.12598,
            max_speed_pct: 100.0,
            heading_hysteresis_deg: 10.0,
            correction_freshness_ms: 5000,
            use_error_correction: true
        }
    }
}
