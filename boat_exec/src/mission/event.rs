//! # Mission events
//!
//! A [`MissionEvent`] is built from scratch at the start of every cycle, so nothing that happened
//! on an earlier cycle can leak into the decisions of this one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::msg::{Command, EcefStatus, Message, MsgId, NedStatus};

use crate::nav::{GeocentricCoordinate, LocalCoordinate};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything the mission controller reacts to on one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MissionEvent {
    /// Navigation reached its destination on the last processing step
    pub nav_done: bool,

    /// Navigation failed on the last processing step
    pub nav_error: bool,

    /// The RC receiver is online
    pub receiver_detected: bool,

    /// The message received this cycle, if any
    pub inbound: Option<Inbound>,

    /// An error was raised during this cycle
    pub have_error: bool
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An inbound message, classified by what the mission does with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Inbound {
    Reset,
    Override,
    ReturnStation,

    /// Adopt the current position as the station
    SaveStation,

    SetStation(LocalCoordinate),
    StartRescue(LocalCoordinate),
    Origin(GeocentricCoordinate),
    GeocentricError(GeocentricCoordinate),
    Heartbeat,

    /// An acknowledgement, already consumed by the link
    Ack,

    /// Anything the boat doesn't act on
    Ignored(MsgId)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Inbound {
    pub fn classify(msg: &Message) -> Self {
        match *msg {
            Message::CmdOther { command, .. } => match command {
                Command::ResetBoat => Inbound::Reset,
                Command::ReturnStation => Inbound::ReturnStation,
                Command::Override => Inbound::Override,
                Command::SaveStation => Inbound::SaveStation,
                Command::RequestOrigin => Inbound::Ignored(MsgId::CmdOther)
            },
            Message::GpsNed { status, north, east, down, .. } => {
                let ned = LocalCoordinate::new(north as f64, east as f64, down as f64);
                match status {
                    NedStatus::SetStation => Inbound::SetStation(ned),
                    NedStatus::StartRescue => Inbound::StartRescue(ned),
                    NedStatus::BoatPosition => Inbound::Ignored(MsgId::GpsNed)
                }
            },
            Message::GpsEcef { status, x, y, z, .. } => {
                let ecef = GeocentricCoordinate::new(x as f64, y as f64, z as f64);
                match status {
                    EcefStatus::Origin => Inbound::Origin(ecef),
                    EcefStatus::Error => Inbound::GeocentricError(ecef)
                }
            },
            Message::Heartbeat { .. } => Inbound::Heartbeat,
            Message::Ack { .. } => Inbound::Ack,
            ref m => Inbound::Ignored(m.id())
        }
    }
}

impl MissionEvent {
    /// True if the given inbound message arrived this cycle.
    pub fn has(&self, inbound: Inbound) -> bool {
        self.inbound == Some(inbound)
    }

    pub fn is_reset(&self) -> bool {
        self.has(Inbound::Reset)
    }

    pub fn is_override(&self) -> bool {
        self.has(Inbound::Override)
    }

    pub fn is_return_station(&self) -> bool {
        self.has(Inbound::ReturnStation)
    }

    pub fn origin(&self) -> Option<GeocentricCoordinate> {
        match self.inbound {
            Some(Inbound::Origin(o)) => Some(o),
            _ => None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::msg::{ErrorCode, Status};

    #[test]
    fn test_classify() {
        assert_eq!(
            Inbound::classify(&Message::CmdOther { ack: true, command: Command::Override }),
            Inbound::Override
        );
        assert_eq!(
            Inbound::classify(&Message::GpsNed {
                ack: false, status: NedStatus::StartRescue, north: 12.5, east: -3.0, down: 0.0
            }),
            Inbound::StartRescue(LocalCoordinate::new(12.5, -3.0, 0.0))
        );
        assert!(matches!(
            Inbound::classify(&Message::GpsEcef {
                ack: true, status: EcefStatus::Origin, x: 1.0, y: 2.0, z: 3.0
            }),
            Inbound::Origin(_)
        ));
        assert_eq!(
            Inbound::classify(&Message::StatusAndError {
                ack: false, status: Status::Online, error: ErrorCode::None
            }),
            Inbound::Ignored(MsgId::StatusAndError)
        );
    }

    #[test]
    fn test_event_queries() {
        let event = MissionEvent {
            inbound: Some(Inbound::ReturnStation),
            ..MissionEvent::default()
        };
        assert!(event.is_return_station());
        assert!(!event.is_override());
        assert!(!event.is_reset());
        assert!(event.origin().is_none());
    }
}
