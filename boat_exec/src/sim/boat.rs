//! Simulated boat hardware

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    nav::{GeocentricCoordinate, GeodeticCoordinate, LocalCoordinate, Origin},
    platform::{
        Actuators, BarometerReading, BarometerSensor, Clock, Compass, Gps, GpsStatus, Motor,
        OverrideSignal, Platform, PlatformError, Subsystem
    }
};
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic model of the hull.
#[derive(Debug, Clone)]
pub struct HullParams {
    /// Speed at full forward power.
    ///
    /// Units: meters/second
    pub max_speed_mps: f64,

    /// Turn rate at full rudder.
    ///
    /// Units: degrees/second
    pub max_turn_rate_dps: f64,

    /// Units: microseconds
    pub motor_stop_us: u16,
    pub motor_range_us: u16,
    pub rudder_stop_us: u16,
    pub rudder_range_us: u16
}

/// A simulated boat.
///
/// The boat's clock only moves when [`SimBoat::advance`] is called, which also moves the hull
/// according to the last actuator pulses. While the RC receiver has control the hull drifts to a
/// stop.
#[derive(Debug)]
pub struct SimBoat {
    hull: HullParams,

    clock_ms: u64,

    origin: Origin,
    position: LocalCoordinate,

    /// Units: degrees
    heading_deg: f64,

    gps: GpsStatus,
    barometer: Option<BarometerReading>,

    receiver_triggered: bool,
    receiver_control: bool,

    left_motor_us: u16,
    right_motor_us: u16,
    rudder_us: u16,

    init_failures: HashSet<Subsystem>,
    initialised: Vec<Subsystem>,
    num_reboots: u32
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for HullParams {
    fn default() -> Self {
        Self {
            max_speed_mps: 2.0,
            max_turn_rate_dps: 45.0,
            motor_stop_us: 1500,
            motor_range_us: 500,
            rudder_stop_us: 1500,
            rudder_range_us: 400
        }
    }
}

impl SimBoat {
    /// Create a boat floating at `start`, pointing north, with a GPS fix.
    pub fn new(start: GeodeticCoordinate) -> Self {
        Self::with_hull(start, HullParams::default())
    }

    pub fn with_hull(start: GeodeticCoordinate, hull: HullParams) -> Self {
        Self {
            clock_ms: 0,
            origin: Origin::from_geocentric(start.to_geocentric()),
            position: LocalCoordinate::default(),
            heading_deg: 0.0,
            gps: GpsStatus {
                initialized: true,
                connected: true,
                has_fix: true,
                has_position: true
            },
            barometer: Some(BarometerReading {
                temperature_c: 15.0,
                altitude_m: 0.0
            }),
            receiver_triggered: false,
            receiver_control: false,
            left_motor_us: hull.motor_stop_us,
            right_motor_us: hull.motor_stop_us,
            rudder_us: hull.rudder_stop_us,
            init_failures: HashSet::new(),
            initialised: Vec::new(),
            num_reboots: 0,
            hull
        }
    }

    /// Move time forward, integrating the hull's motion.
    pub fn advance(&mut self, dt_ms: u64) {
        let dt_s = dt_ms as f64 / 1000.0;

        let (speed_mps, turn_rate_dps) = match self.receiver_control {
            true => (0.0, 0.0),
            false => self.hull_rates()
        };

        self.heading_deg = maths::wrap_deg_360(self.heading_deg + turn_rate_dps * dt_s);

        let heading_rad = self.heading_deg.to_radians();
        self.position.north += speed_mps * dt_s * heading_rad.cos();
        self.position.east += speed_mps * dt_s * heading_rad.sin();

        self.clock_ms += dt_ms;
    }

    /// Start position of the boat, which is also the natural origin of the local frame.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Position relative to the start position.
    pub fn position(&self) -> LocalCoordinate {
        self.position
    }

    pub fn set_position(&mut self, position: LocalCoordinate) {
        self.position = position;
    }

    pub fn heading(&self) -> f64 {
        self.heading_deg
    }

    pub fn set_heading(&mut self, heading_deg: f64) {
        self.heading_deg = maths::wrap_deg_360(heading_deg);
    }

    pub fn set_gps_status(&mut self, status: GpsStatus) {
        self.gps = status;
    }

    pub fn set_barometer(&mut self, reading: Option<BarometerReading>) {
        self.barometer = reading;
    }

    /// Switch the RC transmitter on or off.
    pub fn set_receiver(&mut self, triggered: bool) {
        self.receiver_triggered = triggered;
    }

    /// Make the given subsystem fail to initialise.
    pub fn fail_init(&mut self, subsystem: Subsystem) {
        self.init_failures.insert(subsystem);
    }

    pub fn has_receiver_control(&self) -> bool {
        self.receiver_control
    }

    pub fn motor_pulse(&self, motor: Motor) -> u16 {
        match motor {
            Motor::Left => self.left_motor_us,
            Motor::Right => self.right_motor_us
        }
    }

    pub fn rudder_pulse(&self) -> u16 {
        self.rudder_us
    }

    /// Subsystems successfully initialised since the last reboot, in order.
    pub fn initialised(&self) -> &[Subsystem] {
        &self.initialised
    }

    pub fn num_reboots(&self) -> u32 {
        self.num_reboots
    }

    fn hull_rates(&self) -> (f64, f64) {
        let h = &self.hull;

        let motor_us = (f64::from(self.left_motor_us) + f64::from(self.right_motor_us)) / 2.0;
        let (power, _) = maths::clamp(
            (motor_us - f64::from(h.motor_stop_us)) / f64::from(h.motor_range_us),
            -1.0,
            1.0
        );
        let (throw, _) = maths::clamp(
            (f64::from(self.rudder_us) - f64::from(h.rudder_stop_us))
                / f64::from(h.rudder_range_us),
            -1.0,
            1.0
        );

        (power * h.max_speed_mps, throw * h.max_turn_rate_dps)
    }
}

impl Clock for SimBoat {
    fn now_ms(&self) -> u64 {
        self.clock_ms
    }
}

impl Gps for SimBoat {
    fn status(&self) -> GpsStatus {
        self.gps
    }

    fn ecef_position(&self) -> Option<GeocentricCoordinate> {
        match self.gps.has_position {
            true => Some(self.position.to_geocentric(&self.origin)),
            false => None
        }
    }
}

impl Compass for SimBoat {
    fn heading_deg(&self) -> f64 {
        self.heading_deg
    }
}

impl Actuators for SimBoat {
    fn set_motor_pulse(&mut self, motor: Motor, pulse_us: u16) {
        match motor {
            Motor::Left => self.left_motor_us = pulse_us,
            Motor::Right => self.right_motor_us = pulse_us
        }
    }

    fn set_rudder_pulse(&mut self, pulse_us: u16) {
        self.rudder_us = pulse_us;
    }

    fn give_receiver_control(&mut self) {
        if !self.receiver_control {
            debug!("SimBoat: receiver has control");
        }
        self.receiver_control = true;
    }

    fn give_micro_control(&mut self) {
        if self.receiver_control {
            debug!("SimBoat: micro has control");
        }
        self.receiver_control = false;
    }
}

impl OverrideSignal for SimBoat {
    fn is_triggered(&self) -> bool {
        self.receiver_triggered
    }
}

impl BarometerSensor for SimBoat {
    fn reading(&self) -> Option<BarometerReading> {
        self.barometer
    }
}

impl Platform for SimBoat {
    fn init_subsystem(&mut self, subsystem: Subsystem) -> Result<(), PlatformError> {
        if self.init_failures.contains(&subsystem) {
            return Err(PlatformError::InitFailed(subsystem, "simulated failure".into()))
        }

        self.initialised.push(subsystem);
        Ok(())
    }

    fn poll_sensors(&mut self) {}

    fn reboot(&mut self) {
        info!("SimBoat: rebooting");
        self.num_reboots += 1;
        self.initialised.clear();
        self.receiver_control = false;
        self.left_motor_us = self.hull.motor_stop_us;
        self.right_motor_us = self.hull.motor_stop_us;
        self.rudder_us = self.hull.rudder_stop_us;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn boat() -> SimBoat {
        SimBoat::new(GeodeticCoordinate::new(0.0, 0.0, 0.0))
    }

    #[test]
    fn test_hull_motion() {
        let mut b = boat();

        // Stopped pulses leave the boat where it is
        b.advance(1000);
        assert_eq!(b.now_ms(), 1000);
        assert!(b.position().north.abs() < 1e-9);

        // Full power north for one second
        b.set_motor_pulse(Motor::Left, 2000);
        b.set_motor_pulse(Motor::Right, 2000);
        b.advance(1000);
        assert!((b.position().north - 2.0).abs() < 1e-9);
        assert!(b.position().east.abs() < 1e-9);

        // Right rudder turns clockwise
        b.set_rudder_pulse(1900);
        b.advance(1000);
        assert!((b.heading() - 45.0).abs() < 1e-9);
        assert!(b.position().east > 0.0);
    }

    #[test]
    fn test_receiver_control_stops_hull() {
        let mut b = boat();
        b.set_motor_pulse(Motor::Left, 2000);
        b.set_motor_pulse(Motor::Right, 2000);
        b.give_receiver_control();
        b.advance(1000);
        assert!(b.position().north.abs() < 1e-9);

        b.give_micro_control();
        b.advance(1000);
        assert!(b.position().north > 1.0);
    }

    #[test]
    fn test_gps_position() {
        let mut b = boat();
        b.set_position(LocalCoordinate::new(10.0, -5.0, 0.0));

        let local = b.ecef_position().unwrap().to_local(b.origin());
        assert!((local.north - 10.0).abs() < 1e-6);
        assert!((local.east + 5.0).abs() < 1e-6);

        b.set_gps_status(GpsStatus::default());
        assert!(b.ecef_position().is_none());
    }

    #[test]
    fn test_init_failures_and_reboot() {
        let mut b = boat();
        b.fail_init(Subsystem::Barometer);

        assert!(b.init_subsystem(Subsystem::Gps).is_ok());
        assert_eq!(
            b.init_subsystem(Subsystem::Barometer).unwrap_err().subsystem(),
            Subsystem::Barometer
        );
        assert_eq!(b.initialised(), &[Subsystem::Gps]);

        b.set_rudder_pulse(1100);
        b.reboot();
        assert_eq!(b.num_reboots(), 1);
        assert!(b.initialised().is_empty());
        assert_eq!(b.rudder_pulse(), 1500);
    }
}
