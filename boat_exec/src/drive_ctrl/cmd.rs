//! Drive commands

use serde::Serialize;

/// A command for drive control, produced by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DriveCmd {
    /// Stop the motors and centre the rudder
    Stop,

    /// Drive straight ahead with the rudder centred
    Forward {
        /// Units: percent
        speed_pct: f64
    },

    /// Drive while holding a heading
    ForwardHeading {
        /// Units: percent
        speed_pct: f64,

        /// Units: degrees, clockwise from north
        heading_deg: f64
    }
}

/// Side the rudder is turning the boat towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RudderDirection {
    Left,
    Right
}

/// Demand on the rudder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RudderDem {
    pub direction: RudderDirection,

    /// Units: percent of the full throw
    pub percent: f64
}

impl RudderDem {
    pub const CENTRED: RudderDem = RudderDem {
        direction: RudderDirection::Right,
        percent: 0.0
    };
}

impl Default for RudderDem {
    fn default() -> Self {
        Self::CENTRED
    }
}
