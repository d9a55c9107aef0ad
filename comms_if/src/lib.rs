//! # Communications interface crate.
//!
//! Provides the telemetry link shared by the boat and the shore station: the message catalogue,
//! the frame codec, the acknowledgement and retry machine, and the transports that carry frames.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Frame codec
pub mod frame;

/// Acknowledgement and retry link
pub mod link;

/// Message catalogue
pub mod msg;

/// Network module
pub mod net;

/// Byte transports
pub mod transport;
