//! # Platform interfaces
//!
//! The boat's hardware is accessed only through the traits in this module. The executable uses
//! either the real hardware drivers or the [`SimBoat`](crate::sim::SimBoat).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nav::GeocentricCoordinate;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

pub trait Gps {
    /// State of the receiver as of the last sensor poll.
    fn status(&self) -> GpsStatus;

    /// Latest geocentric position, if the receiver has one.
    fn ecef_position(&self) -> Option<GeocentricCoordinate>;
}

pub trait Compass {
    /// Current heading of the hull.
    ///
    /// Units: degrees, clockwise from north in [0, 360)
    fn heading_deg(&self) -> f64;
}

/// Pulse outputs and the control multiplexer between the micro and the RC receiver.
pub trait Actuators {
    /// Units: microseconds
    fn set_motor_pulse(&mut self, motor: Motor, pulse_us: u16);

    /// Units: microseconds
    fn set_rudder_pulse(&mut self, pulse_us: u16);

    /// Route the RC receiver's outputs to the actuators.
    fn give_receiver_control(&mut self);

    /// Route the micro's outputs to the actuators.
    fn give_micro_control(&mut self);
}

/// The RC receiver's override line.
pub trait OverrideSignal {
    fn is_triggered(&self) -> bool;
}

pub trait BarometerSensor {
    fn reading(&self) -> Option<BarometerReading>;
}

/// All of the boat's hardware.
pub trait Platform: Clock + Gps + Compass + Actuators + OverrideSignal + BarometerSensor {
    /// Bring up a hardware subsystem.
    fn init_subsystem(&mut self, subsystem: Subsystem) -> Result<(), PlatformError>;

    /// Read any sensors which need polling, called once per cycle.
    fn poll_sensors(&mut self);

    /// Reboot the boat. Hardware implementations don't return, the simulation resets itself.
    fn reboot(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the GPS receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsStatus {
    pub initialized: bool,
    pub connected: bool,
    pub has_fix: bool,
    pub has_position: bool
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarometerReading {
    /// Units: degrees celsius
    pub temperature_c: f32,

    /// Units: meters
    pub altitude_m: f32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motor {
    Left,
    Right
}

/// Hardware subsystems which can be brought up at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subsystem {
    Xbee,
    I2c,
    Gps,
    Drive,
    Barometer,
    TiltCompass
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("The {0:?} subsystem failed to initialise: {1}")]
    InitFailed(Subsystem, String)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GpsStatus {
    /// True when the receiver is able to provide a usable position.
    pub fn is_ready(&self) -> bool {
        self.initialized && self.connected && self.has_fix && self.has_position
    }
}

impl Subsystem {
    /// Error code reported to the shore when this subsystem fails.
    pub fn error_code(self) -> ErrorCode {
        match self {
            Subsystem::Xbee => ErrorCode::Xbee,
            Subsystem::I2c => ErrorCode::I2c,
            Subsystem::Gps => ErrorCode::Gps,
            // The drive has no dedicated code, its pulse generator sits on the I2C bus
            Subsystem::Drive => ErrorCode::I2c,
            Subsystem::Barometer => ErrorCode::Barometer,
            Subsystem::TiltCompass => ErrorCode::TiltCompass
        }
    }
}

impl PlatformError {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            PlatformError::InitFailed(s, _) => *s
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gps_readiness() {
        let mut status = GpsStatus {
            initialized: true,
            connected: true,
            has_fix: true,
            has_position: true
        };
        assert!(status.is_ready());

        status.has_fix = false;
        assert!(!status.is_ready());
        assert!(!GpsStatus::default().is_ready());
    }
}
