//! Simulated shore station

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace, warn};

use crate::nav::GeocentricCoordinate;
use comms_if::{
    frame::{FrameEncoder, FrameParser},
    msg::{Command, EcefStatus, Message},
    transport::LoopbackTransport
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// System ID used by the shore station.
const SHORE_SYS_ID: u8 = 255;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A shore station on the far end of a [`LoopbackTransport`].
///
/// The shore answers the boat's origin requests with its configured origin and acknowledges
/// everything else the boat asks to have acknowledged.
pub struct SimShore {
    encoder: FrameEncoder,
    parser: FrameParser,

    /// Origin sent in answer to origin requests, `None` leaves requests unanswered
    origin: Option<GeocentricCoordinate>,

    auto_ack: bool,

    received: Vec<Message>,

    /// Number of messages sent to the boat
    num_sent: u64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimShore {
    pub fn new(origin: Option<GeocentricCoordinate>) -> Self {
        Self {
            encoder: FrameEncoder::new(SHORE_SYS_ID, 0),
            parser: FrameParser::new(),
            origin,
            auto_ack: true,
            received: Vec::new(),
            num_sent: 0
        }
    }

    /// Enable or disable acknowledgement of the boat's messages.
    pub fn set_auto_ack(&mut self, auto_ack: bool) {
        self.auto_ack = auto_ack;
    }

    /// Send a message to the boat.
    pub fn send(&mut self, transport: &mut LoopbackTransport, msg: Message) {
        debug!("Shore sending {:?}", msg);
        match self.encoder.encode(&msg) {
            Ok(frame) => {
                transport.inject(&frame);
                self.num_sent += 1;
            },
            Err(e) => warn!("Shore could not send {:?}: {}", msg.id(), e)
        }
    }

    /// Read everything the boat has sent and answer it, returning the number of messages read.
    pub fn exchange(&mut self, transport: &mut LoopbackTransport) -> usize {
        let mut inbound = Vec::new();

        self.parser.extend(&transport.take_sent());
        while let Some(result) = self.parser.next_frame() {
            match result {
                Ok(msg) => inbound.push(msg),
                Err(e) => debug!("Shore dropped a frame: {}", e)
            }
        }

        for msg in inbound.iter() {
            trace!("Shore received {:?}", msg);

            match *msg {
                Message::CmdOther { command: Command::RequestOrigin, .. } => {
                    if let Some(o) = self.origin {
                        self.send(transport, Message::GpsEcef {
                            ack: false,
                            status: EcefStatus::Origin,
                            x: o.x as f32,
                            y: o.y as f32,
                            z: o.z as f32
                        });
                    }
                },
                ref m => if self.auto_ack {
                    if let Some(ack) = m.ack_reply() {
                        self.send(transport, ack);
                    }
                }
            }
        }

        let num = inbound.len();
        self.received.extend(inbound);
        num
    }

    /// Every message received from the boat so far.
    pub fn received(&self) -> &[Message] {
        &self.received
    }

    pub fn clear_received(&mut self) {
        self.received.clear();
    }

    /// Number of messages sent to the boat so far, answers included.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::{
        link::{LinkParams, RequestClass, TelemetryLink},
        msg::{ErrorCode, Status}
    };

    #[test]
    fn test_shore_answers_boat() {
        let origin = GeocentricCoordinate::new(6378137.0, 0.0, 0.0);
        let mut shore = SimShore::new(Some(origin));
        let mut link = TelemetryLink::new(LoopbackTransport::new(), LinkParams::default());

        link.send(Message::CmdOther { ack: true, command: Command::RequestOrigin }, true, 0)
            .unwrap();
        link.send(
            Message::StatusAndError { ack: true, status: Status::Online, error: ErrorCode::None },
            true,
            0
        ).unwrap();

        assert_eq!(shore.exchange(link.transport_mut()), 2);
        assert_eq!(shore.num_sent(), 2);

        // Origin first, then the acknowledgement of the status
        match link.receive().unwrap() {
            Some(Message::GpsEcef { status: EcefStatus::Origin, x, .. }) => {
                assert_eq!(x, 6378137.0)
            },
            m => panic!("Expected the origin, got {:?}", m)
        }
        assert!(matches!(link.receive().unwrap(), Some(Message::Ack { .. })));

        assert!(!link.is_pending(RequestClass::Origin));
        assert!(!link.is_pending(RequestClass::Message(comms_if::msg::MsgId::StatusAndError)));
    }

    #[test]
    fn test_silent_shore() {
        let mut shore = SimShore::new(None);
        shore.set_auto_ack(false);
        let mut link = TelemetryLink::new(LoopbackTransport::new(), LinkParams::default());

        link.send(Message::CmdOther { ack: true, command: Command::RequestOrigin }, true, 0)
            .unwrap();
        link.send(
            Message::StatusAndError { ack: true, status: Status::Online, error: ErrorCode::None },
            true,
            0
        ).unwrap();

        assert_eq!(shore.exchange(link.transport_mut()), 2);
        assert_eq!(shore.num_sent(), 0);
        assert_eq!(link.receive().unwrap(), None);
    }
}
