//! Mission tests, running the full boat stack against the simulated boat and shore

use super::*;
use crate::{
    drive_ctrl::{self, DriveCtrl, DriveMode},
    nav::{self, GeodeticCoordinate, LocalCoordinate, NavCtrl},
    params::Subsystems,
    platform::{Clock, GpsStatus, Subsystem},
    sim::{SimBoat, SimShore}
};
use comms_if::{
    link::{LinkParams, RequestClass, TelemetryLink},
    msg::{Command, EcefStatus, ErrorCode, Message, NedStatus, Status},
    transport::LoopbackTransport
};

const CYCLE_MS: u64 = 20;

struct Harness {
    mission: Mission<SimBoat, LoopbackTransport>,
    shore: SimShore,

    /// The shore sent something to the boat during the last cycle
    shore_replied: bool
}

impl Harness {
    /// A boat at lat 0, lon 0 whose shore answers origin requests if `answer_origin` is set.
    fn new(boat: SimBoat, answer_origin: bool) -> Self {
        let origin = match answer_origin {
            true => Some(boat.origin().ecef),
            false => None
        };

        let mission = Mission::new(
            boat,
            TelemetryLink::new(LoopbackTransport::new(), LinkParams::default()),
            NavCtrl::new(nav::Params::default()),
            DriveCtrl::new(drive_ctrl::Params::default()),
            Params::default(),
            Subsystems::default()
        );

        Self {
            mission,
            shore: SimShore::new(origin),
            shore_replied: false
        }
    }

    fn booted() -> Self {
        let mut h = Self::new(equator_boat(), true);
        h.mission.init().unwrap();
        h
    }

    /// Booted and holding on the station at the start position.
    fn on_station() -> Self {
        let mut h = Self::booted();
        assert!(h.run_until(|m| m.state() == idle(), 1000));
        h.settle();
        h.shore.clear_received();
        h
    }

    fn now(&self) -> u64 {
        self.mission.platform().now_ms()
    }

    fn cycle(&mut self) {
        self.mission.step().unwrap();

        let num_sent = self.shore.num_sent();
        self.shore.exchange(self.mission.link_mut().transport_mut());
        self.shore_replied = self.shore.num_sent() > num_sent;

        self.mission.platform_mut().advance(CYCLE_MS);
    }

    /// Cycle until the boat has read everything the shore sent, such as the acknowledgements of
    /// its status reports.
    fn settle(&mut self) {
        for _ in 0..50 {
            if !self.shore_replied && self.mission.last_event().inbound.is_none() {
                return
            }
            self.cycle();
        }
        panic!("The link never went quiet");
    }

    fn run_for(&mut self, duration_ms: u64) {
        for _ in 0..(duration_ms / CYCLE_MS) {
            self.cycle();
        }
    }

    /// Cycle until the predicate holds, returning false if it doesn't within `max_ms`.
    fn run_until<F>(&mut self, pred: F, max_ms: u64) -> bool
    where
        F: Fn(&Mission<SimBoat, LoopbackTransport>) -> bool
    {
        for _ in 0..(max_ms / CYCLE_MS) {
            self.cycle();
            if pred(&self.mission) {
                return true
            }
        }
        false
    }

    /// Send a message from the shore, read by the boat on the next cycle.
    fn send(&mut self, msg: Message) {
        self.settle();
        self.shore.send(self.mission.link_mut().transport_mut(), msg);
    }

    fn sent_status(&self, status: Status) -> bool {
        self.shore.received().iter().any(|m| matches!(
            m,
            Message::StatusAndError { status: s, error: ErrorCode::None, .. } if *s == status
        ))
    }

    fn sent_error(&self, code: ErrorCode) -> bool {
        self.shore.received().iter().any(|m| matches!(
            m,
            Message::StatusAndError { error: e, .. } if *e == code
        ))
    }

    fn count_sent<F: Fn(&Message) -> bool>(&self, pred: F) -> usize {
        self.shore.received().iter().filter(|m| pred(m)).count()
    }
}

fn equator_boat() -> SimBoat {
    SimBoat::new(GeodeticCoordinate::new(0.0, 0.0, 0.0))
}

fn no_fix_boat() -> SimBoat {
    let mut boat = equator_boat();
    boat.set_gps_status(GpsStatus {
        initialized: true,
        connected: true,
        has_fix: false,
        has_position: false
    });
    boat
}

fn idle() -> MissionState {
    MissionState::StationKeep(StationKeepMode::Idle)
}

fn returning() -> MissionState {
    MissionState::StationKeep(StationKeepMode::Return)
}

fn command(command: Command) -> Message {
    Message::CmdOther { ack: true, command }
}

fn ned(status: NedStatus, north: f32, east: f32) -> Message {
    Message::GpsNed { ack: true, status, north, east, down: 0.0 }
}

#[test]
fn test_boot() {
    let mut h = Harness::new(equator_boat(), true);
    h.mission.init().unwrap();

    assert_eq!(h.mission.state(), MissionState::SetOrigin);
    assert!(h.mission.has_autonomy());
    assert_eq!(
        h.mission.platform().initialised(),
        &[
            Subsystem::Xbee,
            Subsystem::I2c,
            Subsystem::Gps,
            Subsystem::TiltCompass,
            Subsystem::Drive,
            Subsystem::Barometer
        ]
    );

    h.shore.exchange(h.mission.link_mut().transport_mut());
    assert!(h.sent_status(Status::Online));
    assert_eq!(
        h.count_sent(|m| matches!(m, Message::CmdOther { command: Command::RequestOrigin, .. })),
        1
    );
}

#[test]
fn test_fatal_init() {
    let mut boat = equator_boat();
    boat.fail_init(Subsystem::Drive);
    let mut h = Harness::new(boat, true);

    match h.mission.init() {
        Err(MissionError::Fatal(e)) => assert_eq!(e.subsystem(), Subsystem::Drive),
        r => panic!("Expected a fatal error, got {:?}", r)
    }

    h.shore.exchange(h.mission.link_mut().transport_mut());
    assert!(h.sent_error(ErrorCode::I2c));
    assert!(!h.sent_status(Status::Online));
    assert_eq!(h.mission.last_error(), ErrorCode::I2c);
}

#[test]
fn test_origin_handshake_and_station_keeping() {
    let mut h = Harness::booted();

    assert!(h.run_until(|m| m.nav().has_origin(), 200));
    assert!(h.run_until(|m| m.state() == idle(), 1000));

    let station = h.mission.station().unwrap();
    assert!(station.north.abs() < 1e-3);
    assert!(station.east.abs() < 1e-3);

    assert!(h.sent_status(Status::ReturnStation));
    assert!(h.sent_status(Status::StationKeep));
    assert_eq!(h.mission.drive().mode(), DriveMode::Idle);
    assert!(!h.mission.is_latched());
}

#[test]
fn test_drift_triggers_return() {
    let mut h = Harness::on_station();

    // Within the drift limit nothing happens
    h.mission.platform_mut().set_position(LocalCoordinate::new(10.0, 0.0, 0.0));
    h.run_for(4000);
    assert_eq!(h.mission.state(), idle());

    h.mission.platform_mut().set_position(LocalCoordinate::new(20.0, 0.0, 0.0));
    assert!(h.run_until(|m| m.state() == returning(), 3100));
    assert!(h.sent_status(Status::ReturnStation));

    // Navigation steers on the following cycle
    h.cycle();
    assert_eq!(h.mission.drive().mode(), DriveMode::Track);
}

#[test]
fn test_geocentric_correction_is_added() {
    let mut h = Harness::on_station();

    // At lat 0, lon 0 the geocentric z axis points north
    h.send(Message::GpsEcef {
        ack: false,
        status: EcefStatus::Error,
        x: 0.0,
        y: 0.0,
        z: 15.0
    });
    h.cycle();
    assert!(h.mission.nav().is_correction_enabled());

    assert!(h.run_until(|m| m.state() == returning(), 3100));
    let corrected = h.mission.nav().local_position().unwrap();
    assert!((corrected.north - 15.0).abs() < 1e-3);
}

#[test]
fn test_rescue() {
    let mut h = Harness::on_station();

    h.send(ned(NedStatus::StartRescue, 30.0, 0.0));
    h.cycle();

    assert_eq!(h.mission.state(), MissionState::Rescue(RescueMode::Goto));
    assert_eq!(h.mission.rescue_target(), Some(LocalCoordinate::new(30.0, 0.0, 0.0)));
    assert!(h.sent_status(Status::StartRescue));

    h.mission.platform_mut().set_position(LocalCoordinate::new(30.0, 0.0, 0.0));
    assert!(h.run_until(|m| m.state() == MissionState::Rescue(RescueMode::Support), 2000));
    assert!(h.sent_status(Status::RescueSuccess));
    assert_eq!(h.mission.drive().mode(), DriveMode::Idle);

    // Support holds until told otherwise
    h.run_for(5000);
    assert_eq!(h.mission.state(), MissionState::Rescue(RescueMode::Support));

    h.send(command(Command::ReturnStation));
    h.cycle();
    assert_eq!(h.mission.state(), returning());
}

#[test]
fn test_new_rescue_supersedes_rescue() {
    let mut h = Harness::on_station();

    h.send(ned(NedStatus::StartRescue, 30.0, 0.0));
    h.cycle();
    h.send(ned(NedStatus::StartRescue, -40.0, 10.0));
    h.cycle();

    assert_eq!(h.mission.state(), MissionState::Rescue(RescueMode::Goto));
    assert_eq!(h.mission.rescue_target(), Some(LocalCoordinate::new(-40.0, 10.0, 0.0)));
}

#[test]
fn test_set_station_ignored_during_rescue() {
    let mut h = Harness::on_station();

    h.send(ned(NedStatus::StartRescue, 30.0, 0.0));
    h.cycle();
    h.send(ned(NedStatus::SetStation, 10.0, 5.0));
    h.cycle();

    assert!(h.mission.state().is_rescue());
    assert_eq!(
        h.mission.pending_station(),
        Some(StationSource::Explicit(LocalCoordinate::new(10.0, 5.0, 0.0)))
    );

    // Returning to the station abandons the rescue, and the pending station is then adopted
    h.send(command(Command::ReturnStation));
    h.cycle();
    assert_eq!(h.mission.state(), returning());
    assert_eq!(h.mission.station(), Some(LocalCoordinate::new(10.0, 5.0, 0.0)));
    assert!(h.mission.pending_station().is_none());
}

#[test]
fn test_explicit_station() {
    let mut h = Harness::on_station();

    h.send(ned(NedStatus::SetStation, 10.0, 5.0));
    h.cycle();

    assert_eq!(h.mission.station(), Some(LocalCoordinate::new(10.0, 5.0, 0.0)));
    assert_eq!(h.mission.state(), returning());
}

#[test]
fn test_save_station() {
    let mut h = Harness::on_station();

    h.mission.platform_mut().set_position(LocalCoordinate::new(-8.0, 3.0, 0.0));
    h.run_for(100);
    h.send(command(Command::SaveStation));
    assert!(h.run_until(|m| m.state() == idle(), 2000));

    let station = h.mission.station().unwrap();
    assert!((station.north + 8.0).abs() < 0.1);
    assert!((station.east - 3.0).abs() < 0.1);
}

#[test]
fn test_override_command_latches() {
    let mut h = Harness::on_station();

    h.send(command(Command::Override));
    h.cycle();

    assert_eq!(h.mission.state(), MissionState::Override);
    assert!(h.mission.is_latched());
    assert!(!h.mission.has_autonomy());
    assert!(h.mission.platform().has_receiver_control());
    assert!(h.sent_status(Status::Override));

    // The latch holds the boat in override even with the receiver off
    h.run_for(5000);
    assert_eq!(h.mission.state(), MissionState::Override);

    // Returning to the station clears the latch, autonomy comes back on the next cycle
    h.send(command(Command::ReturnStation));
    h.cycle();
    assert!(!h.mission.is_latched());
    assert!(h.run_until(|m| m.state() == returning(), 100));
    assert!(h.mission.has_autonomy());
    assert!(!h.mission.platform().has_receiver_control());
}

#[test]
fn test_receiver_override() {
    let mut h = Harness::on_station();

    h.mission.platform_mut().set_receiver(true);
    h.cycle();
    assert_eq!(h.mission.state(), MissionState::Override);
    assert!(h.mission.is_receiver_online());
    assert!(!h.mission.is_latched());

    h.run_for(1000);
    h.mission.platform_mut().set_receiver(false);

    // The receiver stays online for the hold time after the last trigger
    h.run_for(1000);
    assert_eq!(h.mission.state(), MissionState::Override);
    assert!(h.run_until(|m| m.state() == returning(), 2000));
    assert!(!h.mission.is_receiver_online());
    assert!(h.mission.has_autonomy());
}

#[test]
fn test_override_wins_on_same_cycle() {
    let mut h = Harness::on_station();

    h.send(ned(NedStatus::SetStation, 10.0, 5.0));
    h.mission.platform_mut().set_receiver(true);
    h.cycle();

    // The station is still taken, but the receiver has the final say
    assert_eq!(h.mission.station(), Some(LocalCoordinate::new(10.0, 5.0, 0.0)));
    assert_eq!(h.mission.state(), MissionState::Override);
    assert!(h.mission.last_event().receiver_detected);
}

#[test]
fn test_no_origin() {
    let mut h = Harness::new(equator_boat(), false);
    h.mission.init().unwrap();

    let mut entered_ms = None;
    for _ in 0..(25_000 / CYCLE_MS) {
        let now_ms = h.now();
        h.cycle();
        if h.mission.state() == MissionState::Override {
            entered_ms = Some(now_ms);
            break
        }
    }

    // Five attempts spaced by the retry timeout
    assert_eq!(entered_ms, Some(20_000));
    assert_eq!(h.mission.last_error(), ErrorCode::NoOrigin);
    assert!(h.mission.is_latched());
    assert!(h.sent_error(ErrorCode::NoOrigin));
    assert_eq!(
        h.count_sent(|m| matches!(m, Message::CmdOther { command: Command::RequestOrigin, .. })),
        5
    );

    // Nothing from the shore for over ten seconds
    assert!(h.mission.is_shore_lost());
}

#[test]
fn test_station_fix_timeout() {
    let mut h = Harness::new(no_fix_boat(), true);
    h.mission.init().unwrap();

    assert!(h.run_until(|m| m.state() == MissionState::SetStation, 200));
    h.run_for(10_000);
    assert_eq!(h.mission.state(), MissionState::SetStation);

    assert!(h.run_until(|m| m.state() == MissionState::Override, 11_000));
    assert_eq!(h.mission.last_error(), ErrorCode::NoStation);
    assert!(h.sent_error(ErrorCode::NoStation));
}

#[test]
fn test_return_station_without_station() {
    let mut h = Harness::new(no_fix_boat(), true);
    h.mission.init().unwrap();
    assert!(h.run_until(|m| m.state() == MissionState::SetStation, 200));

    h.send(command(Command::ReturnStation));
    h.cycle();

    assert_eq!(h.mission.state(), MissionState::Override);
    assert_eq!(h.mission.last_error(), ErrorCode::NoStation);
    assert!(h.mission.is_latched());
}

#[test]
fn test_navigation_error() {
    let mut h = Harness::on_station();

    // Losing the fix while navigating fails navigation
    h.send(ned(NedStatus::StartRescue, 30.0, 0.0));
    h.cycle();
    h.mission.platform_mut().set_gps_status(GpsStatus::default());

    assert!(h.run_until(|m| m.state() == MissionState::Override, 200));
    assert_eq!(h.mission.last_error(), ErrorCode::Navigation);
    assert!(h.mission.is_latched());
}

#[test]
fn test_reset() {
    let mut h = Harness::on_station();
    h.send(command(Command::Override));
    h.cycle();
    assert!(h.mission.is_latched());

    h.send(command(Command::ResetBoat));
    h.cycle();

    assert_eq!(h.mission.platform().num_reboots(), 1);
    assert_eq!(h.mission.state(), MissionState::SetOrigin);
    assert!(h.mission.station().is_none());
    assert!(!h.mission.is_latched());
    assert!(!h.mission.nav().has_origin());
    assert!(h.sent_status(Status::Online));

    // The whole boot sequence runs again
    assert!(h.run_until(|m| m.state() == idle(), 1000));
}

#[test]
fn test_periodic_telemetry() {
    let mut h = Harness::booted();
    h.run_for(10_020);

    assert_eq!(h.count_sent(|m| matches!(m, Message::Heartbeat { .. })), 3);
    assert_eq!(h.count_sent(|m| matches!(m, Message::Barometer { .. })), 1);
    assert!(h.count_sent(|m| matches!(
        m,
        Message::GpsNed { status: NedStatus::BoatPosition, .. }
    )) >= 4);
}

#[test]
fn test_shore_heartbeat_loss_is_only_logged() {
    let mut h = Harness::on_station();

    h.run_for(11_000);
    assert!(h.mission.is_shore_lost());
    assert_eq!(h.mission.state(), idle());

    h.send(Message::Heartbeat { data: 1 });
    h.cycle();
    assert!(!h.mission.is_shore_lost());
}

#[test]
fn test_one_message_per_cycle() {
    let mut h = Harness::booted();
    assert!(h.run_until(|m| m.state() == idle(), 1000));

    // The acknowledgement of the StationKeep report is still queued ahead of the command
    h.shore.send(h.mission.link_mut().transport_mut(), command(Command::Override));
    h.cycle();
    assert_eq!(h.mission.last_event().inbound, Some(Inbound::Ack));
    assert_eq!(h.mission.state(), idle());

    h.cycle();
    assert_eq!(h.mission.last_event().inbound, Some(Inbound::Override));
    assert_eq!(h.mission.state(), MissionState::Override);
}

#[test]
fn test_non_finite_station_is_dropped() {
    let mut h = Harness::on_station();
    let station = h.mission.station();
    let dropped = h.mission.link().dropped_frames();

    h.send(ned(NedStatus::SetStation, f32::NAN, 0.0));
    for _ in 0..(400 / CYCLE_MS) {
        h.cycle();
        let rudder_us = h.mission.platform().rudder_pulse();
        assert!((1100..=1900).contains(&rudder_us), "rudder at {} us", rudder_us);
    }

    assert_eq!(h.mission.link().dropped_frames(), dropped + 1);
    assert_eq!(h.mission.station(), station);
    assert_eq!(h.mission.state(), idle());
    assert!(h.mission.pending_station().is_none());
}

#[test]
fn test_origin_request_cancelled_by_override() {
    let mut h = Harness::new(equator_boat(), false);
    h.mission.init().unwrap();

    h.run_for(1000);
    h.mission.platform_mut().set_receiver(true);
    h.cycle();
    assert_eq!(h.mission.state(), MissionState::Override);

    // The request would have run out of attempts at 20 s had it been left pending
    h.run_for(24_000);
    assert_eq!(h.mission.state(), MissionState::Override);
    assert_ne!(h.mission.last_error(), ErrorCode::NoOrigin);
    assert!(!h.sent_error(ErrorCode::NoOrigin));
    assert!(!h.mission.is_latched());
    assert!(!h.mission.link().is_pending(RequestClass::Origin));

    // Once the receiver is gone autonomy asks for the origin again
    h.shore.clear_received();
    h.mission.platform_mut().set_receiver(false);
    assert!(h.run_until(|m| m.state() == MissionState::SetOrigin, 3000));
    assert!(h.mission.has_autonomy());
    assert!(h.mission.link().is_pending(RequestClass::Origin));
    assert_eq!(
        h.count_sent(|m| matches!(m, Message::CmdOther { command: Command::RequestOrigin, .. })),
        1
    );
}
