//! # Network Module
//!
//! This module carries telemetry link frames over ZMQ. The boat and the shore station each own one
//! end of a `PAIR` socket, every zmq message holds one or more whole frames.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod socket;
mod zmq_transport;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use zmq;
pub use socket::{MonitoredSocket, MonitoredSocketError, SocketOptions};
pub use zmq_transport::ZmqTransport;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters for the telemetry link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint of the telemetry link socket, for example `"tcp://localhost:5020"`
    pub link_endpoint: String,

    /// If true this end of the link binds to the endpoint, otherwise it connects. The shore
    /// station binds and the boat connects.
    pub link_bind: bool,

    /// Time to wait for the first connection before giving up.
    ///
    /// Units: milliseconds
    pub connect_timeout_ms: i32
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NetParams {
    fn default() -> Self {
        Self {
            link_endpoint: String::from("tcp://localhost:5020"),
            link_bind: false,
            connect_timeout_ms: 1000
        }
    }
}
