//! Main boat-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Load parameters and initialise the control modules
//!     - Boot the boat (subsystem initialisation, origin request)
//!     - Main loop:
//!         - Scripted shore message injection (loopback transport only)
//!         - Mission cycle:
//!             - Event acquisition (navigation edges, RC receiver, inbound message)
//!             - Sensor polling, link retries, navigation and drive control
//!             - Periodic telemetry
//!             - State dispatch and cross-cutting rules
//!         - Simulated shore exchange (loopback transport only)
//!         - Archive writing
//!
//! If the boat fails to boot it is held in safe mode with the actuators stopped until the
//! executable is stopped.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use boat_lib::{
    data_store::{DataStore, SafeModeCause},
    drive_ctrl::DriveCtrl,
    mission::{self, Mission, MissionError},
    nav::{GeodeticCoordinate, NavCtrl},
    params::{BoatExecParams, TransportKind},
    platform::Clock,
    sim::{SimBoat, SimShore}
};
use comms_if::{
    link::{LinkParams, TelemetryLink},
    net::{zmq, ZmqTransport},
    transport::{LoopbackTransport, Transport, TransportError}
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    host,
    logger::{level_from_str, logger_init},
    module::State,
    script_interpreter::{PendingMessages, ScriptInterpreter},
    session::{self, Session},
    time
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "boat_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    let exec_params: BoatExecParams = util::params::load(
        "boat_exec.toml"
    ).wrap_err("Could not load exec params")?;

    // Initialise logger
    logger_init(level_from_str(&exec_params.log_level), &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("AtLAs Boat Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mission_params: mission::Params = util::params::load(
        "mission.toml"
    ).wrap_err("Could not load mission params")?;

    let link_params: LinkParams = util::params::load(
        "link.toml"
    ).wrap_err("Could not load link params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE SCRIPT ----

    // A script given on the command line takes precedence over the one in the parameters
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let script_path = match args.len() {
        1 => exec_params.script_path.clone(),
        2 => Some(args[1].clone()),
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1))
    };

    let mut script = match script_path {
        Some(ref path) => {
            if exec_params.transport != TransportKind::Loopback {
                return Err(eyre!("Scripts can only be run over the loopback transport"));
            }

            info!("Loading script from \"{}\"", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} messages\n",
                si.get_duration(),
                si.get_num_msgs()
            );

            Some(si)
        },
        None => {
            info!("No script provided, the boat will wait for the shore\n");
            None
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut nav = NavCtrl::default();
    nav.init("nav.toml", &session)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    let mut drive = DriveCtrl::default();
    drive.init("drive_ctrl.toml", &session)
        .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE PLATFORM AND LINK ----

    let [start_lat_deg, start_lon_deg] = exec_params.sim_start_lat_lon_deg;
    let boat = SimBoat::new(GeodeticCoordinate::new(start_lat_deg, start_lon_deg, 0.0));

    // The simulated shore gives the boat's start position as the origin
    let mut shore = SimShore::new(Some(boat.origin().ecef));

    let zmq_ctx = zmq::Context::new();

    let transport = match exec_params.transport {
        TransportKind::Loopback => {
            info!("Using the loopback transport with a simulated shore");
            BoatTransport::Loopback(LoopbackTransport::new())
        },
        TransportKind::Zmq => {
            let t = ZmqTransport::new(&zmq_ctx, &exec_params.net)
                .wrap_err("Failed to initialise the ZMQ transport")?;
            info!("ZMQ transport initialised on {}", exec_params.net.link_endpoint);
            BoatTransport::Zmq(t)
        }
    };

    let mut mission = Mission::new(
        boat,
        TelemetryLink::new(transport, link_params),
        nav,
        drive,
        mission_params,
        exec_params.subsystems.clone()
    );
    mission.open_archives(&session)
        .wrap_err("Failed to initialise mission archives")?;

    // ---- INITIALISE DATASTORE ----

    let mut ds = DataStore::default();

    // ---- BOOT ----

    match mission.init() {
        Ok(()) => info!("Boot complete"),
        Err(MissionError::Fatal(e)) => {
            error!("Boot failed, holding the boat in safe mode: {}", e);
            ds.make_safe(SafeModeCause::InitFailed(e.subsystem()));
        },
        Err(e) => return Err(e).wrap_err("Failed to boot the boat")
    }

    let cycle_period_ms = time::seconds_to_millis(CYCLE_PERIOD_S);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(
            CYCLE_FREQUENCY_HZ,
            mission.platform().now_ms() as f64 / 1000.0
        );

        // ---- LINK MONITORING ----

        if let BoatTransport::Zmq(t) = mission.link().transport() {
            ds.set_link_connected(t.is_connected());
        }

        // ---- SCRIPT PROCESSING ----

        if let Some(ref mut si) = script {
            match si.get_pending(ds.sim_time_s) {
                PendingMessages::None => (),
                PendingMessages::Some(msgs) => {
                    if let BoatTransport::Loopback(t) = mission.link_mut().transport_mut() {
                        for msg in msgs {
                            shore.send(t, msg);
                            ds.num_script_msgs += 1;
                        }
                    }
                },
                // Exit if end of script reached
                PendingMessages::EndOfScript => {
                    info!("End of script reached, stopping");
                    break
                }
            }
        }

        // ---- MISSION PROCESSING ----

        if ds.safe {
            mission.make_safe();
        }
        else {
            match mission.step() {
                Ok(()) => ds.mission_rpt = Some(mission.report()),
                Err(MissionError::Fatal(e)) => {
                    error!("Reboot failed, holding the boat in safe mode: {}", e);
                    ds.make_safe(SafeModeCause::InitFailed(e.subsystem()));
                    mission.make_safe();
                },
                Err(e) => warn!("Error during mission processing: {}", e)
            }
        }

        if let BoatTransport::Loopback(t) = mission.link_mut().transport_mut() {
            shore.exchange(t);
        }

        if ds.is_1_hz_cycle {
            if let Some(ref rpt) = ds.mission_rpt {
                debug!(
                    "Mission: {}, autonomy {}, latch {}, last error {}",
                    rpt.state, rpt.autonomy, rpt.latch, rpt.last_error
                );
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = mission.write() {
            warn!("Could not write archives: {}", e);
        }

        // ---- SIMULATION ----

        mission.platform_mut().advance(cycle_period_ms);

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    info!(
        "Ran {} cycles, injected {} scripted messages",
        ds.num_cycles, ds.num_script_msgs
    );
    session::save_with_timestamp("link_stats.json", mission.link().stats());
    session.save("final_mission_report.json", mission.report());
    session.exit();

    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The transports the telemetry link can run over.
enum BoatTransport {
    Loopback(LoopbackTransport),
    Zmq(ZmqTransport)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Transport for BoatTransport {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, TransportError> {
        match self {
            BoatTransport::Loopback(t) => t.read_available(buf),
            BoatTransport::Zmq(t) => t.read_available(buf)
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match self {
            BoatTransport::Loopback(t) => t.write(bytes),
            BoatTransport::Zmq(t) => t.write(bytes)
        }
    }
}
