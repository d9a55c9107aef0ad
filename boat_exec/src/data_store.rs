//! # Data Store

use log::{info, warn};

use crate::{mission, platform::Subsystem};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the boat has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    /// A subsystem failed to come up at boot
    InitFailed(Subsystem)
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Boat clock time
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the boat is in safe mode. In safe mode the mission doesn't run and the
    /// actuators are held stopped.
    pub safe: bool,

    /// Gives the reason for the boat being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Mission
    pub mission_rpt: Option<mission::StatusReport>,

    /// Last known connection state of the link transport
    pub link_connected: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of scripted shore messages injected so far
    pub num_script_msgs: usize
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the boat into safe mode with the given cause.
    ///
    /// Safe mode can't be left, only a power cycle of the boat clears it.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, sim_time_s: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;
        self.mission_rpt = None;
        self.sim_time_s = sim_time_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    /// Record the connection state of the link, logging any change.
    pub fn set_link_connected(&mut self, connected: bool) {
        if connected != self.link_connected {
            match connected {
                true => info!("Link connected"),
                false => warn!("Link disconnected")
            }
            self.link_connected = connected;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode_keeps_first_cause() {
        let mut ds = DataStore::default();
        assert!(!ds.safe);

        ds.make_safe(SafeModeCause::InitFailed(Subsystem::Gps));
        ds.make_safe(SafeModeCause::InitFailed(Subsystem::Xbee));

        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::InitFailed(Subsystem::Gps)));
    }

    #[test]
    fn test_1_hz_cycles() {
        let mut ds = DataStore::default();
        let mut num_1_hz = 0;

        for _ in 0..100 {
            ds.cycle_start(50.0, 0.0);
            if ds.is_1_hz_cycle {
                num_1_hz += 1;
            }
            ds.cycle_end();
        }

        assert_eq!(num_1_hz, 2);
    }
}
