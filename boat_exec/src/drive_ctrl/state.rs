//! Implementations for the DriveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;

// Internal
use super::{DriveCmd, DriveCtrlError, Params, RudderDem, RudderDirection};
use crate::timer::{TimerId, TimerTable};
use util::{
    archive::{Archived, Archiver},
    maths,
    module::State,
    params,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drive control module state
#[derive(Default)]
pub struct DriveCtrl {
    pub(crate) params: Params,

    mode: DriveMode,

    /// Units: percent
    speed_pct: f64,

    /// Units: degrees
    target_heading_deg: Option<f64>,

    /// Heading error magnitude and turn direction from the last rudder update
    last_error: Option<(f64, RudderDirection)>,

    rudder: RudderDem,

    timers: TimerTable,

    pub(crate) output: ActuatorDems,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to drive control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Units: milliseconds
    pub now_ms: u64,

    /// Current heading of the hull.
    ///
    /// Units: degrees
    pub heading_deg: f64
}

/// Pulse width demands for the actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActuatorDems {
    /// Units: microseconds
    pub left_motor_us: u16,

    /// Units: microseconds
    pub right_motor_us: u16,

    /// Units: microseconds
    pub rudder_us: u16
}

/// Status report for drive control processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub time_ms: u64,
    pub mode: DriveMode,
    pub speed_pct: f64,
    pub target_heading_deg: Option<f64>,

    /// Signed heading error from the last rudder update
    ///
    /// Units: degrees
    pub heading_error_deg: Option<f64>,

    pub rudder_direction: Option<RudderDirection>,
    pub rudder_pct: f64,

    /// True if the bang-bang override set the rudder this cycle
    pub bang_bang: bool,

    pub motor_limited: bool,
    pub rudder_limited: bool,

    pub left_motor_us: u16,
    pub right_motor_us: u16,
    pub rudder_us: u16
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveMode {
    Idle,
    Drive,
    Track
}

impl Default for DriveMode {
    fn default() -> Self {
        DriveMode::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ActuatorDems {
    fn default() -> Self {
        Self::stopped(&Params::default())
    }
}

impl ActuatorDems {
    /// Demands with the motors stopped and the rudder centred.
    pub fn stopped(params: &Params) -> Self {
        Self {
            left_motor_us: params.motor_stop_us,
            right_motor_us: params.motor_stop_us,
            rudder_us: params.rudder_stop_us
        }
    }
}

impl State for DriveCtrl {
    type InitData = &'static str;
    type InitError = DriveCtrlError;

    type InputData = InputData;
    type OutputData = ActuatorDems;
    type StatusReport = StatusReport;
    type ProcError = DriveCtrlError;

    /// Initialise the drive control module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data)
            .map_err(DriveCtrlError::ParamsError)?;
        self.output = ActuatorDems::stopped(&self.params);

        self.arch_report = Archiver::from_path(session, "drive_ctrl/status_report.csv")
            .map_err(|e| DriveCtrlError::ArchiveError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of drive control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport {
            time_ms: input_data.now_ms,
            ..StatusReport::default()
        };

        self.timers.tick(input_data.now_ms);

        if self.mode == DriveMode::Track && self.timers.is_expired(TimerId::RudderUpdate) {
            self.update_rudder(input_data.heading_deg);
            self.timers.new_timer(
                TimerId::RudderUpdate, self.params.rudder_period_ms, input_data.now_ms
            );
        }

        self.output = self.map_pulses();

        self.report.mode = self.mode;
        self.report.speed_pct = self.speed_pct;
        self.report.target_heading_deg = self.target_heading_deg;
        self.report.rudder_pct = self.rudder.percent;
        if self.mode == DriveMode::Track {
            self.report.rudder_direction = Some(self.rudder.direction);
        }
        self.report.left_motor_us = self.output.left_motor_us;
        self.report.right_motor_us = self.output.right_motor_us;
        self.report.rudder_us = self.output.rudder_us;

        trace!(
            "DriveCtrl output: motors {} us, rudder {} us",
            self.output.left_motor_us, self.output.rudder_us
        );

        Ok((self.output, self.report))
    }
}

impl Archived for DriveCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)
    }
}

impl DriveCtrl {
    /// Create a drive control module from the given parameters, without archiving.
    pub fn new(params: Params) -> Self {
        Self {
            output: ActuatorDems::stopped(&params),
            params,
            ..Self::default()
        }
    }

    /// Apply a command from navigation.
    pub fn apply(&mut self, cmd: DriveCmd, now_ms: u64) {
        match cmd {
            DriveCmd::Stop => self.stop(),
            DriveCmd::Forward { speed_pct } => self.forward(speed_pct),
            DriveCmd::ForwardHeading { speed_pct, heading_deg } =>
                self.forward_heading(speed_pct, heading_deg, now_ms)
        }
    }

    /// Drive both motors at the given speed with the rudder centred.
    pub fn forward(&mut self, speed_pct: f64) {
        self.speed_pct = clamp_speed(speed_pct);
        self.mode = DriveMode::Drive;
        self.target_heading_deg = None;
        self.last_error = None;
        self.rudder = RudderDem::CENTRED;
        self.timers.clear(TimerId::RudderUpdate);
    }

    /// Drive both motors at the given speed while steering towards `heading_deg`.
    ///
    /// The first rudder update happens on the next processing step.
    pub fn forward_heading(&mut self, speed_pct: f64, heading_deg: f64, now_ms: u64) {
        if !heading_deg.is_finite() {
            warn!("Ignoring non-finite heading demand, driving with the rudder centred");
            self.forward(speed_pct);
            return
        }

        self.speed_pct = clamp_speed(speed_pct);

        // The rudder keeps running on its own period while only the speed or heading changes
        let tracking = self.mode == DriveMode::Track && self.timers.is_running(TimerId::RudderUpdate);
        if !tracking {
            self.timers.new_timer(TimerId::RudderUpdate, 0, now_ms);
        }

        self.mode = DriveMode::Track;
        self.target_heading_deg = Some(maths::wrap_deg_360(heading_deg));
        self.last_error = None;
    }

    /// Stop both motors and centre the rudder.
    pub fn stop(&mut self) {
        if self.mode != DriveMode::Idle {
            debug!("Drive stopped");
        }
        self.speed_pct = 0.0;
        self.mode = DriveMode::Idle;
        self.target_heading_deg = None;
        self.last_error = None;
        self.rudder = RudderDem::CENTRED;
        self.timers.clear(TimerId::RudderUpdate);
    }

    pub fn mode(&self) -> DriveMode {
        self.mode
    }

    pub fn rudder(&self) -> RudderDem {
        self.rudder
    }

    pub fn speed_pct(&self) -> f64 {
        self.speed_pct
    }

    /// Run one step of the rudder law against the current heading.
    fn update_rudder(&mut self, heading_deg: f64) {
        let target = match self.target_heading_deg {
            Some(t) => t,
            None => return
        };

        // A failed compass reading must never reach the rudder
        if !heading_deg.is_finite() || !target.is_finite() {
            warn!("Non-finite heading ({} deg), centring the rudder", heading_deg);
            self.rudder = RudderDem::CENTRED;
            self.last_error = None;
            return
        }

        let error = maths::ang_diff_deg(heading_deg, target);
        let magnitude = error.abs();
        let direction = if error < 0.0 {
            RudderDirection::Left
        }
        else {
            RudderDirection::Right
        };

        // No derivative on the first update or when the turn direction flips
        let derivative = match self.last_error {
            Some((last_mag, last_dir)) if last_dir == direction => {
                let dt_s = self.params.rudder_period_ms as f64 / 1000.0;
                (magnitude - last_mag) / dt_s
            },
            _ => 0.0
        };

        let u_deg = self.params.k_p * magnitude + self.params.k_d * derivative;
        let (mut u_pct, _) = maths::clamp(u_deg / self.params.max_rudder_deg * 100.0, 0.0, 100.0);

        if self.speed_pct < self.params.bang_bang_speed_pct
            && magnitude > self.params.bang_bang_error_deg
        {
            u_pct = 100.0;
            self.report.bang_bang = true;
        }

        trace!(
            "Rudder update: error {:.2} deg, derivative {:.2} deg/s, demand {:?} {:.1} %",
            error, derivative, direction, u_pct
        );

        self.rudder = RudderDem { direction, percent: u_pct };
        self.last_error = Some((magnitude, direction));
        self.report.heading_error_deg = Some(error);
    }

    /// Map the current speed and rudder demands onto pulse widths.
    fn map_pulses(&mut self) -> ActuatorDems {
        let p = &self.params;

        let motor = maths::lin_map(
            (0.0, 100.0),
            (f64::from(p.motor_stop_us), f64::from(p.motor_stop_us) + f64::from(p.motor_range_us)),
            self.speed_pct
        );
        let (motor_us, motor_limited) = to_pulse(
            motor, p.motor_stop_us, p.motor_min_us, p.motor_max_us
        );

        let throw = self.rudder.percent / 100.0 * f64::from(p.rudder_range_us);
        let rudder = match self.rudder.direction {
            RudderDirection::Left => f64::from(p.rudder_stop_us) - throw,
            RudderDirection::Right => f64::from(p.rudder_stop_us) + throw
        };
        let (rudder_us, rudder_limited) = to_pulse(
            rudder, p.rudder_stop_us, p.rudder_min_us, p.rudder_max_us
        );

        self.report.motor_limited = motor_limited;
        self.report.rudder_limited = rudder_limited;

        ActuatorDems {
            left_motor_us: motor_us,
            right_motor_us: motor_us,
            rudder_us
        }
    }
}

/// Convert a pulse width demand into whole microseconds within `[min_us, max_us]`.
///
/// A non-finite demand gives the stop pulse and counts as limited.
fn to_pulse(demand_us: f64, stop_us: u16, min_us: u16, max_us: u16) -> (u16, bool) {
    if !demand_us.is_finite() {
        return (stop_us, true)
    }

    let (us, limited) = maths::clamp(demand_us.round(), f64::from(min_us), f64::from(max_us));
    (us as u16, limited)
}

/// Speeds are forward only, as a percentage of full power.
fn clamp_speed(speed_pct: f64) -> f64 {
    if speed_pct.is_nan() {
        return 0.0
    }
    maths::clamp(speed_pct, 0.0, 100.0).0
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
