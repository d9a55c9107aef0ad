//! # Telemetry link
//!
//! The link sits between the mission logic and a byte [`Transport`]. It provides:
//!
//! - Framing of outbound messages and parsing of inbound bytes, with malformed frames dropped and
//!   counted.
//! - A sender-side acknowledgement and retry machine. At most one request is outstanding per
//!   [`RequestClass`]. An unanswered request is resent every `retry_timeout_ms` until
//!   `max_attempts` transmissions have been made, after which it is reported as failed exactly
//!   once.
//! - The receiver-side obligation: any inbound message which asks for an acknowledgement is
//!   acknowledged exactly once, as soon as it is received.
//!
//! None of the link's operations block.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use crate::frame::{FrameEncoder, FrameError, FrameParser};
use crate::msg::{Command, EcefStatus, Message, MsgId};
use crate::transport::{Transport, TransportError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the telemetry link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkParams {
    /// Time to wait for an answer before resending a request.
    ///
    /// Units: milliseconds
    pub retry_timeout_ms: u64,

    /// Total number of transmissions of a request before it is considered failed.
    pub max_attempts: u32,

    /// System ID placed in outbound frame headers
    pub sys_id: u8,

    /// Component ID placed in outbound frame headers
    pub comp_id: u8
}

/// A request which is waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRequest {
    pub class: RequestClass,

    /// The message as it was sent, used for resending
    pub message: Message,

    /// Number of transmissions made so far
    pub attempts: u32,

    /// Time at which the request times out.
    ///
    /// Units: milliseconds
    pub deadline_ms: u64
}

/// Tracks outstanding requests, one per class.
#[derive(Debug, Default)]
pub struct RequestTracker {
    params: LinkParams,
    pending: Vec<PendingRequest>
}

/// Outcome of polling the request tracker.
#[derive(Debug, Default, PartialEq)]
pub struct RetryPoll {
    /// Messages which must be resent
    pub resend: Vec<Message>,

    /// Requests which have exhausted their attempts
    pub failed: Vec<RequestClass>
}

/// Link counters, reported in telemetry.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct LinkStats {
    pub num_sent: u64,
    pub num_received: u64,
    pub num_acks_sent: u64,
    pub num_resent: u64,
    pub num_dropped: u64
}

/// The telemetry link.
pub struct TelemetryLink<T: Transport> {
    transport: T,
    encoder: FrameEncoder,
    parser: FrameParser,
    tracker: RequestTracker,
    stats: LinkStats
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Class of a request, at most one request may be outstanding in each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestClass {
    /// The boat's request for the geocentric origin. Answered either by the origin itself or by an
    /// acknowledgement of the request.
    Origin,

    /// Any other acknowledged message, answered by an `Ack` for that message type.
    Message(MsgId)
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Transport error: {0}")]
    TransportError(TransportError),

    #[error("Could not frame an outbound message: {0}")]
    FrameError(FrameError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            retry_timeout_ms: 4000,
            max_attempts: 5,
            sys_id: 1,
            comp_id: 1
        }
    }
}

impl RequestClass {
    /// Get the class a message belongs to when sent with an ack request.
    pub fn of(msg: &Message) -> Self {
        match msg {
            Message::CmdOther { command: Command::RequestOrigin, .. } => RequestClass::Origin,
            m => RequestClass::Message(m.id())
        }
    }

    /// Returns true if `inbound` answers the `pending` message of this class.
    fn is_answered_by(&self, pending: &Message, inbound: &Message) -> bool {
        match (self, inbound) {
            (RequestClass::Origin, Message::GpsEcef { status: EcefStatus::Origin, .. }) => true,
            (_, Message::Ack { msg_id, status }) => {
                *msg_id == pending.id().code() && *status == pending.code()
            },
            _ => false
        }
    }
}

impl RequestTracker {
    pub fn new(params: LinkParams) -> Self {
        Self {
            params,
            pending: Vec::new()
        }
    }

    /// Start tracking a request that has just been sent for the first time.
    ///
    /// Any outstanding request of the same class is replaced.
    pub fn start(&mut self, message: Message, now_ms: u64) -> RequestClass {
        let class = RequestClass::of(&message);

        self.pending.retain(|p| p.class != class);
        self.pending.push(PendingRequest {
            class,
            message,
            attempts: 1,
            deadline_ms: now_ms + self.params.retry_timeout_ms
        });

        class
    }

    /// Resolve any requests answered by the inbound message, returning their classes.
    pub fn resolve(&mut self, inbound: &Message) -> Vec<RequestClass> {
        let mut answered = Vec::new();

        self.pending.retain(|p| {
            if p.class.is_answered_by(&p.message, inbound) {
                answered.push(p.class);
                false
            }
            else {
                true
            }
        });

        answered
    }

    /// Check the outstanding requests for timeouts.
    pub fn poll(&mut self, now_ms: u64) -> RetryPoll {
        let mut poll = RetryPoll::default();
        let timeout_ms = self.params.retry_timeout_ms;
        let max_attempts = self.params.max_attempts;

        self.pending.retain_mut(|p| {
            if now_ms < p.deadline_ms {
                return true
            }

            if p.attempts >= max_attempts {
                poll.failed.push(p.class);
                return false
            }

            p.attempts += 1;
            p.deadline_ms = now_ms + timeout_ms;
            poll.resend.push(p.message);
            true
        });

        poll
    }

    /// Get the pending request in the given class.
    pub fn get(&self, class: RequestClass) -> Option<&PendingRequest> {
        self.pending.iter().find(|p| p.class == class)
    }

    /// Forget any pending request in the given class.
    pub fn cancel(&mut self, class: RequestClass) {
        self.pending.retain(|p| p.class != class);
    }

    /// Forget all pending requests.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T: Transport> TelemetryLink<T> {
    pub fn new(transport: T, params: LinkParams) -> Self {
        Self {
            transport,
            encoder: FrameEncoder::new(params.sys_id, params.comp_id),
            parser: FrameParser::new(),
            tracker: RequestTracker::new(params),
            stats: LinkStats::default()
        }
    }

    /// Send a message.
    ///
    /// If `want_ack` is set the message's ack flag is raised and the message is tracked until it
    /// is answered or runs out of attempts.
    pub fn send(&mut self, msg: Message, want_ack: bool, now_ms: u64) -> Result<(), LinkError> {
        let msg = msg.with_ack(want_ack);

        if want_ack {
            self.tracker.start(msg, now_ms);
        }

        self.write(&msg)
    }

    /// Receive at most one message.
    ///
    /// All bytes pending on the transport are buffered, and parsing stops as soon as a message is
    /// complete so any further messages remain buffered for the next call.
    ///
    /// Inbound messages which answer a pending request resolve it, and messages asking for an
    /// acknowledgement are acknowledged before being returned.
    pub fn receive(&mut self) -> Result<Option<Message>, LinkError> {
        let mut incoming = Vec::new();
        self.transport.read_available(&mut incoming)
            .map_err(LinkError::TransportError)?;
        self.parser.extend(&incoming);

        while let Some(result) = self.parser.next_frame() {
            match result {
                Ok(msg) => {
                    self.stats.num_received += 1;

                    for class in self.tracker.resolve(&msg) {
                        debug!("Request {:?} answered", class);
                    }

                    if let Some(ack) = msg.ack_reply() {
                        self.write(&ack)?;
                        self.stats.num_acks_sent += 1;
                    }

                    return Ok(Some(msg))
                },
                Err(_) => self.stats.num_dropped = self.parser.num_dropped()
            }
        }

        Ok(None)
    }

    /// Resend timed out requests and return the classes of those which have failed.
    pub fn poll_retries(&mut self, now_ms: u64) -> Result<Vec<RequestClass>, LinkError> {
        let poll = self.tracker.poll(now_ms);

        for msg in poll.resend.iter() {
            warn!("No answer to {:?}, resending", msg.id());
            self.write(msg)?;
            self.stats.num_resent += 1;
        }

        for class in poll.failed.iter() {
            warn!("Request {:?} exhausted its attempts", class);
        }

        Ok(poll.failed)
    }

    /// Returns true if a request of the given class is waiting for an answer.
    pub fn is_pending(&self, class: RequestClass) -> bool {
        self.tracker.get(class).is_some()
    }

    /// Forget the pending request in the given class, if there is one.
    pub fn cancel(&mut self, class: RequestClass) {
        if self.tracker.get(class).is_some() {
            debug!("Request {:?} cancelled", class);
        }
        self.tracker.cancel(class);
    }

    /// Forget all pending requests and buffered bytes.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.parser.clear();
    }

    /// Number of malformed frames dropped so far.
    pub fn dropped_frames(&self) -> u64 {
        self.parser.num_dropped()
    }

    pub fn stats(&self) -> LinkStats {
        let mut stats = self.stats;
        stats.num_dropped = self.parser.num_dropped();
        stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn write(&mut self, msg: &Message) -> Result<(), LinkError> {
        let frame = self.encoder.encode(msg)
            .map_err(LinkError::FrameError)?;
        self.stats.num_sent += 1;
        self.transport.write(&frame)
            .map_err(LinkError::TransportError)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::{self, decode_all};
    use crate::msg::*;
    use crate::transport::LoopbackTransport;

    fn new_link() -> TelemetryLink<LoopbackTransport> {
        TelemetryLink::new(LoopbackTransport::new(), LinkParams::default())
    }

    fn encode(msg: &Message) -> Vec<u8> {
        frame::encode(msg).unwrap()
    }

    fn sent(link: &mut TelemetryLink<LoopbackTransport>) -> Vec<Message> {
        decode_all(&link.transport_mut().take_sent()).0
    }

    #[test]
    fn test_origin_retry_exhaustion() {
        let mut link = new_link();
        let request = Message::CmdOther { ack: false, command: Command::RequestOrigin };

        link.send(request, true, 0).unwrap();
        assert_eq!(sent(&mut link).len(), 1);

        let mut failures = Vec::new();
        let mut resends = 0;

        for now in (0..=30_000).step_by(10) {
            let failed = link.poll_retries(now).unwrap();
            resends += sent(&mut link).len();
            for class in failed {
                failures.push((now, class));
            }
        }

        // Five transmissions in total, then one failure at 20 s
        assert_eq!(resends, 4);
        assert_eq!(failures, vec![(20_000, RequestClass::Origin)]);
        assert!(!link.is_pending(RequestClass::Origin));
    }

    #[test]
    fn test_no_failure_before_deadline() {
        let mut link = new_link();
        link.send(Message::CmdOther { ack: false, command: Command::RequestOrigin }, true, 0)
            .unwrap();

        for now in [3999, 4000, 8000, 12000, 16000, 19_999].iter() {
            assert!(link.poll_retries(*now).unwrap().is_empty());
        }
        assert!(link.is_pending(RequestClass::Origin));
        assert_eq!(link.poll_retries(20_000).unwrap(), vec![RequestClass::Origin]);
    }

    #[test]
    fn test_origin_answered_by_origin_message() {
        let mut link = new_link();
        link.send(Message::CmdOther { ack: false, command: Command::RequestOrigin }, true, 0)
            .unwrap();

        let origin = Message::GpsEcef {
            ack: false,
            status: EcefStatus::Origin,
            x: 1.0,
            y: 2.0,
            z: 3.0
        };
        link.transport_mut().inject(&encode(&origin));

        assert_eq!(link.receive().unwrap(), Some(origin));
        assert!(!link.is_pending(RequestClass::Origin));
        assert!(link.poll_retries(40_000).unwrap().is_empty());
    }

    #[test]
    fn test_ack_resolves_matching_request_only() {
        let mut link = new_link();
        let status = Message::StatusAndError {
            ack: false,
            status: Status::RescueSuccess,
            error: ErrorCode::None
        };
        link.send(status, true, 0).unwrap();
        let class = RequestClass::Message(MsgId::StatusAndError);

        // Ack for a different status doesn't resolve it
        link.transport_mut().inject(&encode(&Message::Ack { msg_id: 239, status: 1 }));
        link.receive().unwrap();
        assert!(link.is_pending(class));

        link.transport_mut().inject(&encode(&Message::Ack { msg_id: 239, status: 3 }));
        link.receive().unwrap();
        assert!(!link.is_pending(class));

        // Inbound acks are never acknowledged themselves
        assert_eq!(sent(&mut link).len(), 1);
    }

    #[test]
    fn test_receiver_ack_obligation() {
        let mut link = new_link();
        let cmd = Message::CmdOther { ack: true, command: Command::SaveStation };
        link.transport_mut().inject(&encode(&cmd));

        assert_eq!(link.receive().unwrap(), Some(cmd));
        assert_eq!(link.receive().unwrap(), None);
        assert!(link.poll_retries(100_000).unwrap().is_empty());

        assert_eq!(
            sent(&mut link),
            vec![Message::Ack { msg_id: MsgId::CmdOther.code(), status: 4 }]
        );
    }

    #[test]
    fn test_receive_one_message_per_call() {
        let mut link = new_link();
        let a = Message::Heartbeat { data: 1 };
        let b = Message::CmdOther { ack: false, command: Command::Override };

        let mut bytes = encode(&a);
        bytes.extend_from_slice(&encode(&b));
        link.transport_mut().inject(&bytes);

        assert_eq!(link.receive().unwrap(), Some(a));
        assert_eq!(link.receive().unwrap(), Some(b));
        assert_eq!(link.receive().unwrap(), None);
        assert_eq!(link.dropped_frames(), 0);
    }

    #[test]
    fn test_resync_after_truncated_frame() {
        let mut link = new_link();
        let a = Message::Heartbeat { data: 1 };
        let b = Message::Heartbeat { data: 2 };

        // A frame cut off after three bytes, whose header can't be valid once the next frame
        // follows it
        let mut bytes = encode(&a);
        bytes.extend_from_slice(&[0xFE, 3, 0]);
        bytes.extend_from_slice(&encode(&b));
        link.transport_mut().inject(&bytes);

        assert_eq!(link.receive().unwrap(), Some(a));
        assert_eq!(link.receive().unwrap(), Some(b));
        assert_eq!(link.dropped_frames(), 1);
    }

    #[test]
    fn test_corrupt_frame_loses_only_itself() {
        let mut link = new_link();
        let a = Message::Heartbeat { data: 1 };
        let b = Message::Heartbeat { data: 2 };

        let mut bad = encode(&a);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        bad.extend_from_slice(&encode(&b));
        link.transport_mut().inject(&bad);

        assert_eq!(link.receive().unwrap(), Some(b));
        assert_eq!(link.receive().unwrap(), None);
        assert_eq!(link.dropped_frames(), 1);
        assert_eq!(link.stats().num_received, 1);
    }

    #[test]
    fn test_cancel_stops_retries() {
        let mut link = new_link();
        link.send(Message::CmdOther { ack: false, command: Command::RequestOrigin }, true, 0)
            .unwrap();
        sent(&mut link);

        link.cancel(RequestClass::Origin);
        assert!(!link.is_pending(RequestClass::Origin));

        for now in (0..=30_000).step_by(1000) {
            assert!(link.poll_retries(now).unwrap().is_empty());
        }
        assert!(sent(&mut link).is_empty());
    }

    #[test]
    fn test_new_request_replaces_same_class() {
        let mut link = new_link();
        let request = Message::CmdOther { ack: false, command: Command::RequestOrigin };

        link.send(request, true, 0).unwrap();
        link.send(request, true, 3000).unwrap();

        // The first deadline no longer applies
        assert!(link.poll_retries(4000).unwrap().is_empty());
        assert_eq!(sent(&mut link).len(), 2);
        link.poll_retries(7000).unwrap();
        assert_eq!(sent(&mut link).len(), 1);
    }
}
