//! # Frame codec
//!
//! Messages are carried in MAVLink v1 frames:
//!
//! ```text
//! 0xFE | len | seq | sys_id | comp_id | msg_id | payload[len] | crc_lo | crc_hi
//! ```
//!
//! Framing and checksums are done by the `mavlink` crate, using the dialect defined by
//! [`Message`]. This module finds frame boundaries in a byte stream so that a corrupted frame
//! costs only itself: malformed frames are dropped and counted, and parsing resumes at the next
//! start marker.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use mavlink::{error::MessageReadError, peek_reader::PeekReader, MavHeader};
use thiserror::Error;

// Internal
use crate::msg::{Message, MsgId};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Start of frame marker.
pub const STX: u8 = 0xFE;

/// Number of bytes before the payload, including the start marker.
pub const HEADER_LEN: usize = 6;

/// Number of checksum bytes following the payload.
pub const CRC_LEN: usize = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Header information of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub seq: u8,
    pub sys_id: u8,
    pub comp_id: u8
}

/// Builds frames from messages, incrementing the sequence number for each one.
#[derive(Debug, Clone)]
pub struct FrameEncoder {
    next_seq: u8,
    sys_id: u8,
    comp_id: u8
}

/// Streaming frame parser.
///
/// Bytes are appended with [`FrameParser::extend`] and frames are taken out one at a time with
/// [`FrameParser::next_frame`]. Incomplete frames stay buffered until the rest arrives.
#[derive(Debug, Default)]
pub struct FrameParser {
    buf: Vec<u8>,

    last_header: Option<FrameHeader>,

    num_dropped: u64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a frame is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Unknown message id {0}")]
    UnknownMsgId(u8),

    #[error("Frame for {id:?} has length {found}, expected {expected}")]
    LengthMismatch {
        id: MsgId,
        expected: usize,
        found: usize
    },

    #[error("Checksum mismatch for {0:?}")]
    CrcMismatch(MsgId),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Could not write the frame: {0}")]
    WriteError(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FrameEncoder {
    pub fn new(sys_id: u8, comp_id: u8) -> Self {
        Self {
            next_seq: 0,
            sys_id,
            comp_id
        }
    }

    /// Encode a message into a frame.
    pub fn encode(&mut self, msg: &Message) -> Result<Vec<u8>, FrameError> {
        let header = FrameHeader {
            seq: self.next_seq,
            sys_id: self.sys_id,
            comp_id: self.comp_id
        };

        self.next_seq = self.next_seq.wrapping_add(1);

        encode_with_header(msg, header)
    }
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames dropped since the parser was created.
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped
    }

    /// Header of the most recently accepted frame.
    pub fn last_header(&self) -> Option<FrameHeader> {
        self.last_header
    }

    /// Number of bytes waiting to be parsed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append received bytes to the parse buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Forget all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Take the next frame out of the buffer.
    ///
    /// Returns `None` when no complete frame is buffered, `Some(Ok(msg))` for a valid frame, and
    /// `Some(Err(e))` for a frame which was dropped. Bytes outside of a frame are discarded
    /// without being counted.
    pub fn next_frame(&mut self) -> Option<Result<Message, FrameError>> {
        // Discard everything before the next start marker
        match self.buf.iter().position(|b| *b == STX) {
            Some(start) => {
                self.buf.drain(..start);
            },
            None => {
                self.buf.clear();
                return None
            }
        }

        if self.buf.len() < HEADER_LEN {
            return None
        }

        // Validate the type and length from the header alone, so that a corrupted header can't
        // swallow the frames which follow it
        let len = self.buf[1] as usize;
        let code = self.buf[5];
        let id = match MsgId::from_code(code) {
            Some(id) => id,
            None => return Some(Err(self.drop_bytes(1, FrameError::UnknownMsgId(code))))
        };
        if len != id.payload_len() {
            return Some(Err(self.drop_bytes(1, FrameError::LengthMismatch {
                id,
                expected: id.payload_len(),
                found: len
            })))
        }

        let frame_len = HEADER_LEN + len + CRC_LEN;
        if self.buf.len() < frame_len {
            return None
        }

        let result: Result<(MavHeader, Message), MessageReadError> = {
            let mut reader: PeekReader<&[u8]> = PeekReader::new(&self.buf[..frame_len]);
            mavlink::read_v1_msg(&mut reader)
        };

        match result {
            Ok((header, msg)) => {
                self.buf.drain(..frame_len);
                self.last_header = Some(FrameHeader {
                    seq: header.sequence,
                    sys_id: header.system_id,
                    comp_id: header.component_id
                });
                Some(Ok(msg))
            },
            Err(MessageReadError::Parse(e)) => {
                let err = FrameError::InvalidPayload(format!("{:?}", e));
                Some(Err(self.drop_bytes(frame_len, err)))
            },
            // The reader skips frames with a bad checksum, so it runs out of bytes
            Err(_) => Some(Err(self.drop_bytes(frame_len, FrameError::CrcMismatch(id))))
        }
    }

    fn drop_bytes(&mut self, n: usize, err: FrameError) -> FrameError {
        self.num_dropped += 1;
        self.buf.drain(..n.min(self.buf.len()));
        debug!("Dropped frame: {}", err);
        err
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Encode a message into a frame with the given header.
pub fn encode_with_header(msg: &Message, header: FrameHeader) -> Result<Vec<u8>, FrameError> {
    let mut frame = Vec::with_capacity(HEADER_LEN + msg.id().payload_len() + CRC_LEN);

    mavlink::write_v1_msg(
        &mut frame,
        MavHeader {
            system_id: header.sys_id,
            component_id: header.comp_id,
            sequence: header.seq
        },
        msg
    ).map_err(|e| FrameError::WriteError(format!("{:?}", e)))?;

    Ok(frame)
}

/// Encode a message into a frame with a zeroed header.
pub fn encode(msg: &Message) -> Result<Vec<u8>, FrameError> {
    encode_with_header(msg, FrameHeader::default())
}

/// Decode every valid message found in the given bytes, returning them along with the number of
/// dropped frames.
pub fn decode_all(bytes: &[u8]) -> (Vec<Message>, u64) {
    let mut parser = FrameParser::new();
    parser.extend(bytes);

    let mut msgs = Vec::new();
    while let Some(result) = parser.next_frame() {
        if let Ok(msg) = result {
            msgs.push(msg);
        }
    }

    (msgs, parser.num_dropped())
}

/// Decode the first valid message found in the given bytes.
pub fn decode(bytes: &[u8]) -> Option<Message> {
    decode_all(bytes).0.into_iter().next()
}
