//! Implementations for the Mission state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use serde::Serialize;

// Internal
use super::{
    Inbound, MissionError, MissionEvent, MissionState, Params, RescueMode, StationKeepMode,
    StationSource
};
use crate::{
    drive_ctrl::{self, ActuatorDems, DriveCtrl},
    nav::{self, LocalCoordinate, NavCtrl, Origin},
    params::Subsystems,
    platform::{Motor, Platform, Subsystem},
    timer::{TimerId, TimerTable}
};
use comms_if::{
    link::{RequestClass, TelemetryLink},
    msg::{Command, ErrorCode, Message, NedStatus, Status},
    transport::Transport
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The mission controller, owning the platform, the link, and the control modules.
pub struct Mission<P: Platform, T: Transport> {
    platform: P,
    link: TelemetryLink<T>,
    nav: NavCtrl,
    drive: DriveCtrl,

    params: Params,
    subsystems: Subsystems,

    timers: TimerTable,
    state: MissionState,

    /// Event for the cycle in progress
    event: MissionEvent,

    station: Option<LocalCoordinate>,
    rescue_target: Option<LocalCoordinate>,

    /// Source of the station while in `SetStation`
    station_source: StationSource,

    pending_station: Option<StationSource>,
    pending_rescue: Option<LocalCoordinate>,

    /// Manual-only shutdown latch, while set autonomy is never re-acquired
    latch: bool,

    last_error: ErrorCode,
    receiver_online: bool,

    /// True while the micro drives the actuators
    autonomy: bool,

    shore_lost: bool,
    heartbeat_seq: u8,

    nav_report: nav::StatusReport,

    report: StatusReport,
    arch_report: Archiver
}

/// Status report for mission processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub time_ms: u64,
    pub state: &'static str,
    pub have_error: bool,
    pub last_error: u16,
    pub latch: bool,
    pub autonomy: bool,
    pub receiver_online: bool,
    pub shore_lost: bool,
    pub has_origin: bool,
    pub has_station: bool,
    pub pending_station: bool,
    pub pending_rescue: bool,
    pub num_sent: u64,
    pub num_received: u64,
    pub num_resent: u64,
    pub num_dropped: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<P: Platform, T: Transport> Mission<P, T> {
    /// Create a new mission. The boat isn't brought up until [`Mission::init`] is called.
    pub fn new(
        platform: P,
        link: TelemetryLink<T>,
        nav: NavCtrl,
        drive: DriveCtrl,
        params: Params,
        subsystems: Subsystems
    ) -> Self {
        Self {
            platform,
            link,
            nav,
            drive,
            params,
            subsystems,
            timers: TimerTable::default(),
            state: MissionState::SetOrigin,
            event: MissionEvent::default(),
            station: None,
            rescue_target: None,
            station_source: StationSource::CurrentFix,
            pending_station: None,
            pending_rescue: None,
            latch: false,
            last_error: ErrorCode::None,
            receiver_online: false,
            autonomy: false,
            shore_lost: false,
            heartbeat_seq: 0,
            nav_report: nav::StatusReport::default(),
            report: StatusReport::default(),
            arch_report: Archiver::default()
        }
    }

    /// Archive the mission status report into the given session.
    pub fn open_archives(&mut self, session: &Session) -> Result<(), MissionError> {
        self.arch_report = Archiver::from_path(session, "mission/status_report.csv")
            .map_err(|e| MissionError::ArchiveError(e.to_string()))?;
        Ok(())
    }

    /// Bring up the boat.
    ///
    /// Every enabled subsystem is initialised in turn. If one fails a single best-effort error
    /// report is sent and `MissionError::Fatal` returned, the caller must then hold the boat in a
    /// safe state. Otherwise the boat reports itself online and asks the shore for the origin.
    pub fn init(&mut self) -> Result<(), MissionError> {
        let now_ms = self.platform.now_ms();

        for subsystem in self.enabled_subsystems() {
            if let Err(e) = self.platform.init_subsystem(subsystem) {
                error!("Boot failed: {}", e);
                self.last_error = subsystem.error_code();
                self.send(
                    Message::StatusAndError {
                        ack: false,
                        status: Status::None,
                        error: subsystem.error_code()
                    },
                    false,
                    now_ms
                );
                return Err(MissionError::Fatal(e))
            }
            debug!("{:?} initialised", subsystem);
        }

        self.timers.clear_all();
        self.timers.new_timer(TimerId::Heartbeat, self.params.heartbeat_period_ms, now_ms);
        self.timers.new_timer(TimerId::Barometer, self.params.barometer_period_ms, now_ms);
        self.timers.new_timer(
            TimerId::PositionReport, self.params.position_report_period_ms, now_ms
        );
        self.timers.new_timer(
            TimerId::ShoreHeartbeat, self.params.shore_heartbeat_timeout_ms, now_ms
        );

        self.platform.give_micro_control();
        self.autonomy = true;

        info!("Boat online");
        self.send_status(Status::Online, now_ms);
        self.start_set_origin(now_ms);

        Ok(())
    }

    /// Perform one cycle of the mission.
    ///
    /// Only a fatal error during a commanded reboot is returned, everything else is reported to
    /// the shore and handled inside the state machine.
    pub fn step(&mut self) -> Result<(), MissionError> {
        let now_ms = self.platform.now_ms();
        self.timers.tick(now_ms);

        // ---- EVENT ----

        self.event = MissionEvent {
            nav_done: self.nav_report.done,
            nav_error: self.nav_report.error,
            ..MissionEvent::default()
        };

        self.update_receiver(now_ms);
        self.event.receiver_detected = self.receiver_online;
        self.event.inbound = self.receive();
        self.handle_inbound(now_ms);

        if self.event.nav_error {
            self.set_error(ErrorCode::Navigation, now_ms);
        }

        // ---- BACKGROUND ----

        self.platform.poll_sensors();
        self.poll_link(now_ms);
        self.process_control(now_ms);
        self.periodic_telemetry(now_ms);

        // ---- DISPATCH ----

        match self.state {
            MissionState::SetOrigin => self.dispatch_set_origin(now_ms),
            MissionState::SetStation => self.dispatch_set_station(now_ms),
            MissionState::StationKeep(StationKeepMode::Return) => {
                if self.event.nav_done {
                    self.start_station_idle(now_ms);
                }
            },
            MissionState::StationKeep(StationKeepMode::Idle) => {
                self.dispatch_station_idle(now_ms)
            },
            MissionState::Override => self.dispatch_override(now_ms),
            MissionState::Rescue(RescueMode::Goto) => {
                if self.event.nav_done {
                    info!("Rescue target reached, searching");
                    self.set_state(MissionState::Rescue(RescueMode::Search));
                }
            },
            // Nothing to search with yet, the person is assumed found at the target
            MissionState::Rescue(RescueMode::Search) => self.start_rescue_support(now_ms),
            MissionState::Rescue(RescueMode::Support) => ()
        }

        // ---- CROSS-CUTTING RULES ----

        if self.event.is_return_station() {
            if self.latch {
                info!("Shutdown latch cleared");
            }
            self.latch = false;
            self.pending_rescue = None;

            match self.state {
                MissionState::Override | MissionState::SetOrigin => (),
                _ => match self.station {
                    Some(_) => self.start_station_return(now_ms),
                    None => self.set_error(ErrorCode::NoStation, now_ms)
                }
            }
        }

        if !self.is_manual_or_waiting() {
            if let Some(target) = self.pending_rescue.take() {
                self.start_rescue(target, now_ms);
            }
        }

        if !self.is_manual_or_waiting() && !self.state.is_rescue() {
            if let Some(source) = self.pending_station.take() {
                self.start_set_station(source, now_ms);
            }
        }

        let raise_latch = self.event.have_error || self.event.is_override();
        if raise_latch || self.event.receiver_detected {
            if raise_latch && !self.latch {
                info!("Shutdown latch set");
                self.latch = true;
            }
            if self.state != MissionState::Override {
                self.start_override(now_ms);
            }
        }

        if self.event.is_reset() {
            self.reboot()?;
        }

        self.update_report(now_ms);

        Ok(())
    }

    /// Stop the boat and hold the actuators at their stop pulses, used when the mission can't
    /// run at all.
    pub fn make_safe(&mut self) {
        self.nav.cancel();
        self.drive.stop();
        self.autonomy = false;

        let dems = ActuatorDems::stopped(&self.drive.params);
        self.platform.set_motor_pulse(Motor::Left, dems.left_motor_us);
        self.platform.set_motor_pulse(Motor::Right, dems.right_motor_us);
        self.platform.set_rudder_pulse(dems.rudder_us);
    }

    // ---- ACCESSORS ----

    pub fn state(&self) -> MissionState {
        self.state
    }

    /// The event of the last cycle.
    pub fn last_event(&self) -> MissionEvent {
        self.event
    }

    pub fn station(&self) -> Option<LocalCoordinate> {
        self.station
    }

    pub fn rescue_target(&self) -> Option<LocalCoordinate> {
        self.rescue_target
    }

    pub fn pending_rescue(&self) -> Option<LocalCoordinate> {
        self.pending_rescue
    }

    pub fn pending_station(&self) -> Option<StationSource> {
        self.pending_station
    }

    pub fn is_latched(&self) -> bool {
        self.latch
    }

    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    pub fn has_autonomy(&self) -> bool {
        self.autonomy
    }

    pub fn is_receiver_online(&self) -> bool {
        self.receiver_online
    }

    pub fn is_shore_lost(&self) -> bool {
        self.shore_lost
    }

    pub fn report(&self) -> StatusReport {
        self.report
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn link(&self) -> &TelemetryLink<T> {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut TelemetryLink<T> {
        &mut self.link
    }

    pub fn nav(&self) -> &NavCtrl {
        &self.nav
    }

    pub fn drive(&self) -> &DriveCtrl {
        &self.drive
    }

    // ---- STATE ENTRY ----

    fn set_state(&mut self, state: MissionState) {
        if state != self.state {
            info!("Mission state {} -> {}", self.state, state);

            // An origin request only lives as long as SetOrigin does
            if self.state == MissionState::SetOrigin {
                self.link.cancel(RequestClass::Origin);
            }

            self.state = state;
        }
    }

    fn start_set_origin(&mut self, now_ms: u64) {
        self.set_state(MissionState::SetOrigin);
        self.nav.cancel();
        self.drive.stop();

        info!("Requesting the origin from the shore");
        self.send(
            Message::CmdOther { ack: true, command: Command::RequestOrigin },
            true,
            now_ms
        );
    }

    fn start_set_station(&mut self, source: StationSource, now_ms: u64) {
        self.set_state(MissionState::SetStation);
        self.station_source = source;

        match source {
            StationSource::Explicit(station) => self.adopt_station(station, now_ms),
            StationSource::CurrentFix => match self.nav.local_position() {
                Some(position) => self.adopt_station(position, now_ms),
                None => {
                    info!("Waiting for a fix to save as the station");
                    self.timers.new_timer(
                        TimerId::StationFix, self.params.station_fix_timeout_ms, now_ms
                    );
                }
            }
        }
    }

    fn adopt_station(&mut self, station: LocalCoordinate, now_ms: u64) {
        let station = LocalCoordinate::new(station.north, station.east, 0.0);
        info!("Station set to N {:.1} m, E {:.1} m", station.north, station.east);

        self.station = Some(station);
        self.timers.clear(TimerId::StationFix);
        self.start_station_return(now_ms);
    }

    fn start_station_return(&mut self, now_ms: u64) {
        let station = match self.station {
            Some(s) => s,
            None => {
                self.set_error(ErrorCode::NoStation, now_ms);
                return
            }
        };

        self.set_state(MissionState::StationKeep(StationKeepMode::Return));
        self.timers.clear(TimerId::DriftCheck);
        self.start_goto(station, self.params.station_tolerance_m, now_ms);
        self.send_status(Status::ReturnStation, now_ms);
    }

    fn start_station_idle(&mut self, now_ms: u64) {
        self.set_state(MissionState::StationKeep(StationKeepMode::Idle));
        self.nav.cancel();
        self.drive.stop();
        self.timers.new_timer(TimerId::DriftCheck, self.params.drift_check_period_ms, now_ms);
        self.send_status(Status::StationKeep, now_ms);
    }

    fn start_rescue(&mut self, target: LocalCoordinate, now_ms: u64) {
        info!("Starting rescue at N {:.1} m, E {:.1} m", target.north, target.east);

        self.rescue_target = Some(target);
        self.set_state(MissionState::Rescue(RescueMode::Goto));
        self.timers.clear(TimerId::DriftCheck);
        self.start_goto(target, self.params.rescue_tolerance_m, now_ms);
        self.send_status(Status::StartRescue, now_ms);
    }

    fn start_rescue_support(&mut self, now_ms: u64) {
        self.set_state(MissionState::Rescue(RescueMode::Support));
        self.nav.cancel();
        self.drive.stop();
        info!("Rescue successful");
        self.send_status(Status::RescueSuccess, now_ms);
    }

    fn start_override(&mut self, now_ms: u64) {
        self.set_state(MissionState::Override);
        self.nav.cancel();
        self.drive.stop();
        self.timers.clear(TimerId::DriftCheck);
        self.timers.clear(TimerId::StationFix);

        self.platform.give_receiver_control();
        self.autonomy = false;

        self.send_status(Status::Override, now_ms);
    }

    /// Start navigating, forgetting any edges from earlier navigation.
    fn start_goto(&mut self, dest: LocalCoordinate, tolerance_m: f64, now_ms: u64) {
        self.nav_report.done = false;
        self.nav_report.error = false;
        self.nav.clear_error();
        self.nav.goto_local_coordinate(dest, tolerance_m, now_ms);
    }

    /// Enter the state the boat should be in once it has an origin, returning `false` if there's
    /// nothing to do.
    fn resume(&mut self, now_ms: u64) -> bool {
        if let Some(target) = self.pending_rescue.take() {
            self.start_rescue(target, now_ms);
        }
        else if let Some(source) = self.pending_station.take() {
            self.start_set_station(source, now_ms);
        }
        else if self.station.is_some() {
            self.start_station_return(now_ms);
        }
        else {
            return false
        }

        true
    }

    // ---- DISPATCH ----

    fn dispatch_set_origin(&mut self, now_ms: u64) {
        let ecef = match self.event.origin() {
            Some(o) => o,
            None => return
        };

        self.nav.set_origin(Origin::from_geocentric(ecef));

        if !self.resume(now_ms) {
            self.start_set_station(StationSource::CurrentFix, now_ms);
        }
    }

    fn dispatch_set_station(&mut self, now_ms: u64) {
        if let StationSource::Explicit(station) = self.station_source {
            self.adopt_station(station, now_ms);
            return
        }

        if let Some(position) = self.nav.local_position() {
            self.adopt_station(position, now_ms);
        }
        else if self.timers.is_expired(TimerId::StationFix) {
            self.timers.clear(TimerId::StationFix);
            self.set_error(ErrorCode::NoStation, now_ms);
        }
    }

    fn dispatch_station_idle(&mut self, now_ms: u64) {
        if !self.timers.is_expired(TimerId::DriftCheck) {
            return
        }
        self.timers.clear(TimerId::DriftCheck);

        let distance_m = match self.station.and_then(|s| self.nav.distance_to(&s)) {
            Some(d) => d,
            None => {
                self.set_error(ErrorCode::Navigation, now_ms);
                return
            }
        };

        if distance_m > self.params.station_drift_m {
            info!("Drifted {:.1} m from the station, returning", distance_m);
            self.start_station_return(now_ms);
        }
        else {
            debug!("{:.1} m from the station", distance_m);
            self.timers.new_timer(
                TimerId::DriftCheck, self.params.drift_check_period_ms, now_ms
            );
        }
    }

    fn dispatch_override(&mut self, now_ms: u64) {
        if self.receiver_online || self.latch {
            return
        }

        if !self.nav.has_origin() {
            self.start_set_origin(now_ms);
        }
        else {
            self.resume(now_ms);
        }

        if self.state != MissionState::Override {
            info!("Autonomy re-acquired");
            self.platform.give_micro_control();
            self.autonomy = true;
        }
    }

    // ---- BACKGROUND ----

    fn enabled_subsystems(&self) -> Vec<Subsystem> {
        let mut subsystems = vec![Subsystem::Xbee, Subsystem::I2c];

        if self.subsystems.gps {
            subsystems.push(Subsystem::Gps);
        }
        if self.subsystems.tilt_compass {
            subsystems.push(Subsystem::TiltCompass);
        }
        if self.subsystems.drive {
            subsystems.push(Subsystem::Drive);
        }
        if self.subsystems.barometer {
            subsystems.push(Subsystem::Barometer);
        }

        subsystems
    }

    fn update_receiver(&mut self, now_ms: u64) {
        if self.platform.is_triggered() {
            if !self.receiver_online {
                info!("RC receiver detected");
            }
            self.receiver_online = true;
            self.timers.new_timer(TimerId::ReceiverHold, self.params.receiver_hold_ms, now_ms);
        }
        else if self.receiver_online && self.timers.is_expired(TimerId::ReceiverHold) {
            info!("RC receiver lost");
            self.receiver_online = false;
            self.timers.clear(TimerId::ReceiverHold);
        }
    }

    fn receive(&mut self) -> Option<Inbound> {
        match self.link.receive() {
            Ok(Some(msg)) => {
                debug!("Received {:?}", msg);
                Some(Inbound::classify(&msg))
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Could not receive from the link: {}", e);
                None
            }
        }
    }

    /// Record commands which are acted on later in the cycle, and absorb those which aren't tied
    /// to any state.
    fn handle_inbound(&mut self, now_ms: u64) {
        match self.event.inbound {
            Some(Inbound::SetStation(station)) => {
                self.pending_station = Some(StationSource::Explicit(station));
            },
            Some(Inbound::SaveStation) => {
                self.pending_station = Some(StationSource::CurrentFix);
            },
            Some(Inbound::StartRescue(target)) => {
                self.pending_rescue = Some(target);
            },
            Some(Inbound::GeocentricError(correction)) => {
                self.nav.set_geocentric_error(correction, now_ms);
                if self.nav.params.use_error_correction {
                    self.nav.enable_error_correction();
                }
            },
            Some(Inbound::Heartbeat) => {
                if self.shore_lost {
                    info!("Shore heartbeat regained");
                    self.shore_lost = false;
                }
                self.timers.new_timer(
                    TimerId::ShoreHeartbeat, self.params.shore_heartbeat_timeout_ms, now_ms
                );
            },
            Some(Inbound::Origin(_)) if self.state != MissionState::SetOrigin => {
                debug!("Ignoring origin outside of SetOrigin");
            },
            _ => ()
        }
    }

    fn poll_link(&mut self, now_ms: u64) {
        let failed = match self.link.poll_retries(now_ms) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not resend over the link: {}", e);
                return
            }
        };

        for class in failed {
            let code = match class {
                RequestClass::Origin => ErrorCode::NoOrigin,
                RequestClass::Message(_) => ErrorCode::NoAcknowledgement
            };
            self.set_error(code, now_ms);
        }
    }

    fn process_control(&mut self, now_ms: u64) {
        if self.subsystems.gps {
            let input = nav::InputData {
                now_ms,
                gps: self.platform.status(),
                ecef: self.platform.ecef_position()
            };

            match self.nav.proc(&input) {
                Ok((cmd, report)) => {
                    if let Some(cmd) = cmd {
                        self.drive.apply(cmd, now_ms);
                    }
                    self.nav_report = report;
                },
                Err(e) => warn!("Navigation processing failed: {}", e)
            }
        }

        if self.subsystems.drive {
            let input = drive_ctrl::InputData {
                now_ms,
                heading_deg: self.platform.heading_deg()
            };

            match self.drive.proc(&input) {
                Ok((dems, _)) => {
                    if self.autonomy {
                        self.platform.set_motor_pulse(Motor::Left, dems.left_motor_us);
                        self.platform.set_motor_pulse(Motor::Right, dems.right_motor_us);
                        self.platform.set_rudder_pulse(dems.rudder_us);
                    }
                },
                Err(e) => warn!("Drive control processing failed: {}", e)
            }
        }
    }

    fn periodic_telemetry(&mut self, now_ms: u64) {
        if self.timers.is_expired(TimerId::Heartbeat) {
            if self.subsystems.heartbeat {
                self.heartbeat_seq = self.heartbeat_seq.wrapping_add(1);
                self.send(Message::Heartbeat { data: self.heartbeat_seq }, false, now_ms);
            }
            self.timers.new_timer(TimerId::Heartbeat, self.params.heartbeat_period_ms, now_ms);
        }

        if self.timers.is_expired(TimerId::Barometer) {
            if self.subsystems.barometer {
                if let Some(reading) = self.platform.reading() {
                    self.send(
                        Message::Barometer {
                            temperature_c: reading.temperature_c,
                            altitude: reading.altitude_m
                        },
                        false,
                        now_ms
                    );
                }
            }
            self.timers.new_timer(TimerId::Barometer, self.params.barometer_period_ms, now_ms);
        }

        if self.timers.is_expired(TimerId::PositionReport) {
            if self.subsystems.position_report {
                if let Some(p) = self.nav.local_position() {
                    self.send(
                        Message::GpsNed {
                            ack: false,
                            status: NedStatus::BoatPosition,
                            north: p.north as f32,
                            east: p.east as f32,
                            down: p.down as f32
                        },
                        false,
                        now_ms
                    );
                }
            }
            self.timers.new_timer(
                TimerId::PositionReport, self.params.position_report_period_ms, now_ms
            );
        }

        if self.timers.is_expired(TimerId::ShoreHeartbeat) && !self.shore_lost {
            warn!(
                "No heartbeat from the shore for {} ms",
                self.params.shore_heartbeat_timeout_ms
            );
            self.shore_lost = true;
        }
    }

    // ---- REPORTING ----

    fn send(&mut self, msg: Message, want_ack: bool, now_ms: u64) {
        if let Err(e) = self.link.send(msg, want_ack, now_ms) {
            warn!("Could not send {:?}: {}", msg.id(), e);
        }
    }

    fn send_status(&mut self, status: Status, now_ms: u64) {
        self.send(
            Message::StatusAndError { ack: false, status, error: ErrorCode::None },
            self.params.ack_status_reports,
            now_ms
        );
    }

    /// Report a mission error. Raising an error forces the boat into `Override` at the end of
    /// the cycle.
    fn set_error(&mut self, code: ErrorCode, now_ms: u64) {
        error!("Mission error {:?} in {}", code, self.state);
        self.last_error = code;
        self.event.have_error = true;
        self.send(
            Message::StatusAndError { ack: false, status: Status::None, error: code },
            false,
            now_ms
        );
    }

    fn is_manual_or_waiting(&self) -> bool {
        matches!(self.state, MissionState::Override | MissionState::SetOrigin)
    }

    /// Reboot the platform, forget everything, and boot again.
    fn reboot(&mut self) -> Result<(), MissionError> {
        warn!("Reset commanded, rebooting");
        self.platform.reboot();

        self.nav.reset();
        self.drive.stop();
        self.link.reset();
        self.timers.clear_all();

        self.event = MissionEvent::default();
        self.station = None;
        self.rescue_target = None;
        self.station_source = StationSource::CurrentFix;
        self.pending_station = None;
        self.pending_rescue = None;
        self.latch = false;
        self.last_error = ErrorCode::None;
        self.receiver_online = false;
        self.autonomy = false;
        self.shore_lost = false;
        self.nav_report = nav::StatusReport::default();

        self.init()
    }

    fn update_report(&mut self, now_ms: u64) {
        let stats = self.link.stats();

        self.report = StatusReport {
            time_ms: now_ms,
            state: self.state.name(),
            have_error: self.event.have_error,
            last_error: self.last_error.code(),
            latch: self.latch,
            autonomy: self.autonomy,
            receiver_online: self.receiver_online,
            shore_lost: self.shore_lost,
            has_origin: self.nav.has_origin(),
            has_station: self.station.is_some(),
            pending_station: self.pending_station.is_some(),
            pending_rescue: self.pending_rescue.is_some(),
            num_sent: stats.num_sent,
            num_received: stats.num_received,
            num_resent: stats.num_resent,
            num_dropped: stats.num_dropped
        };
    }
}

impl<P: Platform, T: Transport> Archived for Mission<P, T> {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.nav.write()?;
        self.drive.write()
    }
}
