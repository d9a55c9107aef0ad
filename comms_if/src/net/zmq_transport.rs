//! # ZMQ transport
//!
//! Implements the telemetry link [`Transport`] over a zmq `PAIR` socket.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::transport::{Transport, TransportError};
use super::{MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions, zmq};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Link transport over a zmq `PAIR` socket.
pub struct ZmqTransport {
    socket: MonitoredSocket
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ZmqTransport {
    /// Create the transport from the network parameters.
    ///
    /// This function does not block until the other end connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, MonitoredSocketError> {
        let socket_options = SocketOptions {
            bind: params.link_bind,
            block_on_first_connect: false,
            connect_timeout: params.connect_timeout_ms,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            send_timeout: 0,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::PAIR,
            socket_options,
            &params.link_endpoint
        )?;

        Ok(Self {
            socket
        })
    }

    /// Check if the other end of the link is connected
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }
}

impl Transport for ZmqTransport {
    fn read_available(&mut self, buf: &mut Vec<u8>) -> Result<usize, TransportError> {
        let mut num_read = 0;

        loop {
            match self.socket.recv_bytes(zmq::DONTWAIT) {
                Ok(bytes) => {
                    num_read += bytes.len();
                    buf.extend_from_slice(&bytes);
                },
                Err(zmq::Error::EAGAIN) => break,
                Err(e) => return Err(TransportError::RecvError(e.to_string()))
            }
        }

        Ok(num_read)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.socket.connected() {
            return Err(TransportError::NotConnected)
        }

        self.socket.send(bytes, zmq::DONTWAIT)
            .map_err(|e| TransportError::SendError(e.to_string()))
    }
}
