//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{CourseVector, GeocentricCoordinate, LocalCoordinate, NavError, Origin, Params};
use crate::{
    drive_ctrl::DriveCmd,
    platform::GpsStatus,
    timer::{TimerId, TimerTable}
};
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

/// Navigation module state
#[derive(Default)]
pub struct NavCtrl {
    pub(crate) params: Params,

    mode: NavMode,

    origin: Option<Origin>,

    /// Offset added to measured geocentric positions
    correction: Option<GeocentricCoordinate>,
    use_correction: bool,

    dest: Option<LocalCoordinate>,
    tolerance_m: f64,

    /// Last heading demanded of drive control
    last_heading_deg: Option<f64>,

    /// GPS status sampled on the last processing step
    gps: GpsStatus,

    local_position: Option<LocalCoordinate>,

    done: bool,

    // Edges waiting to be reported
    done_edge: bool,
    error_edge: bool,

    timers: TimerTable,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Units: milliseconds
    pub now_ms: u64,

    pub gps: GpsStatus,

    /// Measured position, uncorrected
    pub ecef: Option<GeocentricCoordinate>
}

/// Status report for navigation processing.
///
/// `done` and `error` are edges, only raised on the step on which navigation finished or failed.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub time_ms: u64,
    pub mode: NavMode,
    pub done: bool,
    pub error: bool,
    pub correction_applied: bool,
    pub north_m: Option<f64>,
    pub east_m: Option<f64>,
    pub distance_m: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub heading_dem_deg: Option<f64>,
    pub speed_dem_pct: Option<f64>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavMode {
    Idle,
    Navigate,
    Error
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for NavCtrl {
    type InitData = &'static str;
    type InitError = NavError;

    type InputData = InputData;
    type OutputData = Option<DriveCmd>;
    type StatusReport = StatusReport;
    type ProcError = NavError;

    /// Initialise the navigation module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        self.params = params::load(init_data)
            .map_err(NavError::ParamsError)?;

        self.arch_report = Archiver::from_path(session, "nav/status_report.csv")
            .map_err(|e| NavError::ArchiveError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of navigation.
    ///
    /// Returns the drive command to apply this cycle, if any.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport {
            time_ms: input_data.now_ms,
            ..StatusReport::default()
        };

        self.timers.tick(input_data.now_ms);

        // Stale corrections must not be applied forever
        if self.timers.is_expired(TimerId::CorrectionFreshness) {
            warn!("Geocentric error correction is stale, disabling it");
            self.timers.clear(TimerId::CorrectionFreshness);
            self.correction = None;
            self.use_correction = false;
        }

        self.update_position(input_data);

        let mut output = None;

        if self.mode == NavMode::Navigate {
            if !self.is_ready() || self.local_position.is_none() {
                warn!("Navigation is no longer ready, stopping");
                self.start_error();
                output = Some(DriveCmd::Stop);
            }
            else if self.timers.is_expired(TimerId::NavUpdate) {
                output = self.update_heading();
                self.timers.new_timer(
                    TimerId::NavUpdate, self.params.update_period_ms, input_data.now_ms
                );
            }
        }

        self.report.mode = self.mode;
        self.report.done = std::mem::take(&mut self.done_edge);
        self.report.error = std::mem::take(&mut self.error_edge);

        Ok((output, self.report))
    }
}

impl Archived for NavCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)
    }
}

impl NavCtrl {
    /// Create a navigation module from the given parameters, without archiving.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Set the origin of the local frame.
    pub fn set_origin(&mut self, origin: Origin) {
        info!(
            "Origin set to lat {:.6} deg, lon {:.6} deg, alt {:.1} m",
            origin.geodetic.lat_deg,
            origin.geodetic.lon_deg,
            origin.geodetic.alt_m
        );
        self.origin = Some(origin);
    }

    /// Store a geocentric error correction, which stays fresh for the correction freshness
    /// period.
    pub fn set_geocentric_error(&mut self, error: GeocentricCoordinate, now_ms: u64) {
        debug!("Geocentric error correction received: {:?}", error);
        self.correction = Some(error);
        self.timers.new_timer(
            TimerId::CorrectionFreshness, self.params.correction_freshness_ms, now_ms
        );
    }

    /// Apply the error correction to measured positions, if one has been received.
    pub fn enable_error_correction(&mut self) {
        if self.correction.is_some() {
            self.use_correction = true;
        }
    }

    pub fn disable_error_correction(&mut self) {
        self.use_correction = false;
    }

    /// Start navigating to the given destination, finishing once within `tolerance_m` of it.
    ///
    /// If navigation isn't ready the module enters the error mode instead. The first course
    /// update happens on the next processing step.
    pub fn goto_local_coordinate(
        &mut self, dest: LocalCoordinate, tolerance_m: f64, now_ms: u64
    ) {
        if !self.is_ready() {
            warn!("Cannot navigate to {:?}, navigation is not ready", dest);
            self.start_error();
            return
        }

        info!(
            "Navigating to N {:.1} m, E {:.1} m (tolerance {:.1} m)",
            dest.north, dest.east, tolerance_m
        );

        self.dest = Some(dest);
        self.tolerance_m = tolerance_m;
        self.done = false;
        self.last_heading_deg = None;
        self.mode = NavMode::Navigate;
        self.timers.new_timer(TimerId::NavUpdate, 0, now_ms);
    }

    /// Stop navigating. The caller is responsible for stopping drive control.
    pub fn cancel(&mut self) {
        if self.mode == NavMode::Navigate {
            debug!("Navigation cancelled");
        }
        self.mode = NavMode::Idle;
        self.timers.clear(TimerId::NavUpdate);
    }

    /// Leave the error mode.
    pub fn clear_error(&mut self) {
        if self.mode == NavMode::Error {
            self.mode = NavMode::Idle;
        }
    }

    /// Forget everything, including the origin.
    pub fn reset(&mut self) {
        let params = self.params.clone();
        let arch_report = std::mem::take(&mut self.arch_report);
        *self = Self {
            params,
            arch_report,
            ..Self::default()
        };
    }

    /// True if the GPS can provide a position and the origin is known.
    pub fn is_ready(&self) -> bool {
        self.gps.is_ready() && self.origin.is_some()
    }

    pub fn has_origin(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn is_navigating(&self) -> bool {
        self.mode == NavMode::Navigate
    }

    pub fn has_error(&self) -> bool {
        self.mode == NavMode::Error
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_correction_enabled(&self) -> bool {
        self.use_correction
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    /// Position in the local frame as of the last processing step.
    pub fn local_position(&self) -> Option<LocalCoordinate> {
        self.local_position
    }

    /// Horizontal distance from the current position to `dest`.
    pub fn distance_to(&self, dest: &LocalCoordinate) -> Option<f64> {
        self.local_position.map(|p| p.distance_to(dest))
    }

    fn start_error(&mut self) {
        self.mode = NavMode::Error;
        self.done = false;
        self.error_edge = true;
        self.timers.clear(TimerId::NavUpdate);
    }

    fn update_position(&mut self, input_data: &InputData) {
        self.gps = input_data.gps;

        self.local_position = match (self.gps.is_ready(), input_data.ecef, self.origin) {
            (true, Some(mut ecef), Some(origin)) => {
                if self.use_correction {
                    if let Some(c) = self.correction {
                        ecef = ecef + c;
                        self.report.correction_applied = true;
                    }
                }
                Some(ecef.to_local(&origin))
            },
            _ => None
        };

        if let Some(p) = self.local_position {
            self.report.north_m = Some(p.north);
            self.report.east_m = Some(p.east);
        }
    }

    /// Compute the course to the destination and the drive command to follow it.
    fn update_heading(&mut self) -> Option<DriveCmd> {
        let (pos, dest) = match (self.local_position, self.dest) {
            (Some(p), Some(d)) => (p, d),
            _ => return None
        };

        let course: CourseVector = pos.course_to(&dest);
        self.report.distance_m = Some(course.distance_m);
        self.report.bearing_deg = Some(course.bearing_deg);

        trace!(
            "Course to destination: {:.2} m at {:.1} deg",
            course.distance_m, course.bearing_deg
        );

        if course.distance_m < self.tolerance_m {
            info!("Destination reached ({:.2} m away)", course.distance_m);
            self.done = true;
            self.done_edge = true;
            self.mode = NavMode::Idle;
            self.timers.clear(TimerId::NavUpdate);
            return Some(DriveCmd::Stop)
        }

        let (speed_pct, _) = maths::clamp(
            course.distance_m * self.params.speed_gain_pct_per_m,
            0.0,
            self.params.max_speed_pct
        );

        let heading_deg = match self.last_heading_deg {
            Some(h) if maths::ang_diff_deg(h, course.bearing_deg).abs()
                <= self.params.heading_hysteresis_deg => h,
            _ => course.bearing_deg
        };
        self.last_heading_deg = Some(heading_deg);

        self.report.heading_dem_deg = Some(heading_deg);
        self.report.speed_dem_pct = Some(speed_pct);

        Some(DriveCmd::ForwardHeading { speed_pct, heading_deg })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::nav::GeodeticCoordinate;

    const READY: GpsStatus = GpsStatus {
        initialized: true,
        connected: true,
        has_fix: true,
        has_position: true
    };

    fn origin() -> Origin {
        Origin::from_geocentric(GeodeticCoordinate::new(36.96, -122.02, 0.0).to_geocentric())
    }

    fn input_at(now_ms: u64, local: LocalCoordinate) -> InputData {
        InputData {
            now_ms,
            gps: READY,
            ecef: Some(local.to_geocentric(&origin()))
        }
    }

    fn ready_nav() -> NavCtrl {
        let mut nav = NavCtrl::new(Params::default());
        nav.set_origin(origin());
        nav.proc(&input_at(0, LocalCoordinate::default())).unwrap();
        nav
    }

    fn heading_dem(cmd: Option<DriveCmd>) -> f64 {
        match cmd {
            Some(DriveCmd::ForwardHeading { heading_deg, .. }) => heading_deg,
            c => panic!("Expected a heading command, got {:?}", c)
        }
    }

    #[test]
    fn test_first_update_towards_destination() {
        let mut nav = ready_nav();
        assert!(nav.is_ready());

        nav.goto_local_coordinate(LocalCoordinate::new(10.0, 0.0, 0.0), 5.0, 0);
        assert!(nav.is_navigating());

        let (out, rpt) = nav.proc(&input_at(20, LocalCoordinate::default())).unwrap();
        match out {
            Some(DriveCmd::ForwardHeading { speed_pct, heading_deg }) => {
                assert!((speed_pct - 1.2598).abs() < 1e-4);
                assert!(heading_deg.abs() < 1e-6 || (heading_deg - 360.0).abs() < 1e-6);
            },
            o => panic!("Expected a heading command, got {:?}", o)
        }
        assert!(!rpt.done);
        assert!(!nav.is_done());

        // Nothing new until the next update period
        let (out, _) = nav.proc(&input_at(500, LocalCoordinate::default())).unwrap();
        assert!(out.is_none());
        let (out, _) = nav.proc(&input_at(1020, LocalCoordinate::default())).unwrap();
        assert!(out.is_some());
    }

    #[test]
    fn test_arrival() {
        let mut nav = ready_nav();
        nav.goto_local_coordinate(LocalCoordinate::new(10.0, 0.0, 0.0), 5.0, 0);

        let (out, rpt) = nav.proc(&input_at(20, LocalCoordinate::new(6.0, 0.0, 0.0))).unwrap();
        assert_eq!(out, Some(DriveCmd::Stop));
        assert!(rpt.done);
        assert!(nav.is_done());
        assert_eq!(nav.mode(), NavMode::Idle);

        // The done edge is only reported once
        let (out, rpt) = nav.proc(&input_at(40, LocalCoordinate::new(6.0, 0.0, 0.0))).unwrap();
        assert!(out.is_none());
        assert!(!rpt.done);
        assert!(nav.is_done());
    }

    #[test]
    fn test_heading_hysteresis() {
        let mut nav = ready_nav();
        nav.goto_local_coordinate(LocalCoordinate::new(100.0, 0.0, 0.0), 2.0, 0);
        let first = heading_dem(nav.proc(&input_at(0, LocalCoordinate::default())).unwrap().0);

        // Bearing moves by about 8 degrees, heading is held
        let pos = LocalCoordinate::new(0.0, -14.0, 0.0);
        let second = heading_dem(nav.proc(&input_at(1000, pos)).unwrap().0);
        assert_eq!(second, first);

        // Bearing moves by about 17 degrees, heading follows
        let pos = LocalCoordinate::new(0.0, -30.0, 0.0);
        let third = heading_dem(nav.proc(&input_at(2000, pos)).unwrap().0);
        assert!((third - 16.699).abs() < 1e-2);
    }

    #[test]
    fn test_not_ready_errors() {
        // No origin
        let mut nav = NavCtrl::new(Params::default());
        nav.proc(&input_at(0, LocalCoordinate::default())).unwrap();
        nav.goto_local_coordinate(LocalCoordinate::new(1.0, 1.0, 0.0), 1.0, 0);
        assert!(nav.has_error());
        let (_, rpt) = nav.proc(&input_at(20, LocalCoordinate::default())).unwrap();
        assert!(rpt.error);

        nav.clear_error();
        assert_eq!(nav.mode(), NavMode::Idle);

        // Losing the fix mid navigation
        let mut nav = ready_nav();
        nav.goto_local_coordinate(LocalCoordinate::new(50.0, 0.0, 0.0), 5.0, 0);
        let mut input = input_at(20, LocalCoordinate::default());
        input.gps.has_fix = false;
        let (out, rpt) = nav.proc(&input).unwrap();
        assert_eq!(out, Some(DriveCmd::Stop));
        assert!(rpt.error);
        assert!(nav.has_error());
    }

    #[test]
    fn test_cancel() {
        let mut nav = ready_nav();
        nav.goto_local_coordinate(LocalCoordinate::new(50.0, 0.0, 0.0), 5.0, 0);
        nav.cancel();
        assert_eq!(nav.mode(), NavMode::Idle);
        let (out, _) = nav.proc(&input_at(20, LocalCoordinate::default())).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_error_correction_freshness() {
        let mut nav = ready_nav();

        // Can't enable without a correction
        nav.enable_error_correction();
        assert!(!nav.is_correction_enabled());

        let o = origin();
        let offset = LocalCoordinate::new(3.0, 4.0, 0.0).to_geocentric(&o).as_vector()
            - o.ecef.as_vector();
        nav.set_geocentric_error(GeocentricCoordinate::from_vector(offset), 1000);
        nav.enable_error_correction();
        assert!(nav.is_correction_enabled());

        let (_, rpt) = nav.proc(&input_at(2000, LocalCoordinate::default())).unwrap();
        assert!(rpt.correction_applied);
        let pos = nav.local_position().unwrap();
        assert!((pos.north - 3.0).abs() < 1e-6 && (pos.east - 4.0).abs() < 1e-6);

        // Correction goes stale 5 s after it arrived
        let (_, rpt) = nav.proc(&input_at(6000, LocalCoordinate::default())).unwrap();
        assert!(!rpt.correction_applied);
        assert!(!nav.is_correction_enabled());
        let pos = nav.local_position().unwrap();
        assert!(pos.north.abs() < 1e-6 && pos.east.abs() < 1e-6);

        nav.enable_error_correction();
        assert!(!nav.is_correction_enabled());
    }

    #[test]
    fn test_disable_error_correction() {
        let mut nav = ready_nav();

        let o = origin();
        let offset = LocalCoordinate::new(3.0, 4.0, 0.0).to_geocentric(&o).as_vector()
            - o.ecef.as_vector();
        nav.set_geocentric_error(GeocentricCoordinate::from_vector(offset), 1000);
        nav.enable_error_correction();
        nav.disable_error_correction();

        let (_, rpt) = nav.proc(&input_at(2000, LocalCoordinate::default())).unwrap();
        assert!(!rpt.correction_applied);
        let pos = nav.local_position().unwrap();
        assert!(pos.north.abs() < 1e-6 && pos.east.abs() < 1e-6);

        // The correction is kept, so it can be re-enabled while fresh
        nav.enable_error_correction();
        assert!(nav.is_correction_enabled());
    }
}
