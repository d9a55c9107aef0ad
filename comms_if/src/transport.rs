//! # Byte transports
//!
//! The telemetry link is transport agnostic, it only needs to be able to read whatever bytes are
//! pending and write a frame. Neither operation may block.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::VecDeque;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A non-blocking byte transport.
pub trait Transport {
    /// Append all bytes currently pending on the transport to `buf`, returning the number of
    /// bytes appended.
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, TransportError>;

    /// Write the given bytes to the transport.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An in-memory transport.
///
/// Bytes injected with [`LoopbackTransport::inject`] are returned by reads, while written bytes
/// are collected and can be taken with [`LoopbackTransport::take_sent`].
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    inbox: VecDeque<u8>,
    outbox: Vec<u8>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("The transport is not connected")]
    NotConnected,

    #[error("Could not send bytes: {0}")]
    SendError(String),

    #[error("Could not receive bytes: {0}")]
    RecvError(String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given bytes available to the next read.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes.iter());
    }

    /// Take all bytes written since the last call.
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbox)
    }
}

impl Transport for LoopbackTransport {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, TransportError> {
        let n = self.inbox.len();
        buf.extend(self.inbox.drain(..));
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.outbox.extend_from_slice(bytes);
        Ok(())
    }
}
