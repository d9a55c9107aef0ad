//! # Message catalogue
//!
//! This module defines the typed messages which are exchanged between the boat (AtLAs) and the
//! shore station (ComPAS), along with the fixed little-endian payload layout of each message.
//!
//! The catalogue is a MAVLink dialect: [`Message`] implements [`mavlink::Message`] so that the
//! `mavlink` crate frames and checksums it (see [`crate::frame`]). This module only deals with
//! the payloads.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use byteorder::{ByteOrder, LittleEndian};
use mavlink::{error::ParserError, MavlinkVersion};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use thiserror::Error;

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Declare a closed enumeration carried on the wire as an integer code.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// The code used to represent this value on the wire.
            pub fn code(self) -> $repr {
                match self {
                    $($name::$variant => $code),+
                }
            }

            /// Get the value represented by the given wire code, or `None` if the code is not
            /// part of the enumeration.
            pub fn from_code(code: $repr) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

code_enum! {
    /// Identifiers of each message type.
    pub enum MsgId: u8 {
        Heartbeat = 236,
        Ack = 237,
        CmdOther = 238,
        StatusAndError = 239,
        GpsEcef = 240,
        GpsNed = 241,
        Barometer = 242,
    }
}

code_enum! {
    /// Commands carried by a `CmdOther` message.
    pub enum Command: u8 {
        /// Reboot the boat, clearing all mission memory
        ResetBoat = 1,
        /// Return to the station and clear the manual shutdown latch
        ReturnStation = 2,
        /// Hand control over to the human operator
        Override = 3,
        /// Adopt the current position as the station
        SaveStation = 4,
        /// Sent by the boat to request the geocentric origin
        RequestOrigin = 5,
    }
}

code_enum! {
    /// Meaning of the coordinate in a `GpsEcef` message.
    pub enum EcefStatus: u8 {
        Origin = 1,
        Error = 2,
    }
}

code_enum! {
    /// Meaning of the coordinate in a `GpsNed` message.
    pub enum NedStatus: u8 {
        SetStation = 1,
        StartRescue = 2,
        BoatPosition = 3,
    }
}

code_enum! {
    /// Status reported in a `StatusAndError` message.
    pub enum Status: u16 {
        None = 0,
        Online = 1,
        StartRescue = 2,
        RescueSuccess = 3,
        Override = 4,
        ReturnStation = 5,
        StationKeep = 6,
    }
}

code_enum! {
    /// Error reported in a `StatusAndError` message.
    pub enum ErrorCode: u16 {
        None = 0,
        NoOrigin = 1,
        NoStation = 2,
        Navigation = 3,
        NoAcknowledgement = 4,
        I2c = 5,
        Gps = 6,
        Xbee = 7,
        Barometer = 8,
        TiltCompass = 9,
    }
}

/// A message exchanged over the telemetry link.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Periodic liveness message, never acknowledged.
    Heartbeat {
        data: u8
    },

    /// Acknowledges a prior message, `status` echoes the command or status code of that message.
    Ack {
        msg_id: u8,
        status: u16
    },

    CmdOther {
        ack: bool,
        command: Command
    },

    StatusAndError {
        ack: bool,
        status: Status,
        error: ErrorCode
    },

    /// Geocentric (ECEF) coordinate.
    ///
    /// Units: meters
    GpsEcef {
        ack: bool,
        status: EcefStatus,
        x: f32,
        y: f32,
        z: f32
    },

    /// Local (NED) coordinate relative to the origin.
    ///
    /// Units: meters
    GpsNed {
        ack: bool,
        status: NedStatus,
        north: f32,
        east: f32,
        down: f32
    },

    Barometer {
        temperature_c: f32,
        altitude: f32
    }
}

/// Errors that can occur while decoding a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("Payload for {id:?} should be {expected} bytes long but is {found}")]
    WrongLength {
        id: MsgId,
        expected: usize,
        found: usize
    },

    #[error("Invalid {field} code {code} in {id:?} payload")]
    InvalidCode {
        id: MsgId,
        field: &'static str,
        code: u16
    },

    #[error("Non-finite {field} in {id:?} payload")]
    NonFinite {
        id: MsgId,
        field: &'static str
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MsgId {
    /// Name of the message type in the dialect.
    pub fn name(self) -> &'static str {
        match self {
            MsgId::Heartbeat => "HEARTBEAT",
            MsgId::Ack => "ACK",
            MsgId::CmdOther => "CMD_OTHER",
            MsgId::StatusAndError => "STATUS_AND_ERROR",
            MsgId::GpsEcef => "GPS_ECEF",
            MsgId::GpsNed => "GPS_NED",
            MsgId::Barometer => "BAROMETER",
        }
    }

    /// Extra byte mixed into the frame checksum, unique to each message layout.
    pub fn crc_extra(self) -> u8 {
        match self {
            MsgId::Heartbeat => 213,
            MsgId::Ack => 203,
            MsgId::CmdOther => 167,
            MsgId::StatusAndError => 220,
            MsgId::GpsEcef => 222,
            MsgId::GpsNed => 122,
            MsgId::Barometer => 136,
        }
    }

    /// Fixed length of the payload of this message type.
    pub fn payload_len(self) -> usize {
        match self {
            MsgId::Heartbeat => 1,
            MsgId::Ack => 3,
            MsgId::CmdOther => 2,
            MsgId::StatusAndError => 5,
            MsgId::GpsEcef => 14,
            MsgId::GpsNed => 14,
            MsgId::Barometer => 8,
        }
    }
}

impl Message {
    /// The identifier of this message's type.
    pub fn id(&self) -> MsgId {
        match self {
            Message::Heartbeat { .. } => MsgId::Heartbeat,
            Message::Ack { .. } => MsgId::Ack,
            Message::CmdOther { .. } => MsgId::CmdOther,
            Message::StatusAndError { .. } => MsgId::StatusAndError,
            Message::GpsEcef { .. } => MsgId::GpsEcef,
            Message::GpsNed { .. } => MsgId::GpsNed,
            Message::Barometer { .. } => MsgId::Barometer,
        }
    }

    /// Returns true if the sender of this message asked for it to be acknowledged.
    pub fn wants_ack(&self) -> bool {
        match *self {
            Message::CmdOther { ack, .. }
            | Message::StatusAndError { ack, .. }
            | Message::GpsEcef { ack, .. }
            | Message::GpsNed { ack, .. } => ack,
            _ => false
        }
    }

    /// Return a copy of this message with the ack request flag set to `ack`.
    ///
    /// Messages without an ack flag are returned unchanged.
    pub fn with_ack(mut self, want_ack: bool) -> Self {
        match &mut self {
            Message::CmdOther { ack, .. }
            | Message::StatusAndError { ack, .. }
            | Message::GpsEcef { ack, .. }
            | Message::GpsNed { ack, .. } => *ack = want_ack,
            _ => ()
        }

        self
    }

    /// The command or status code which an acknowledgement of this message echoes.
    ///
    /// For `StatusAndError` the error code is used if an error is present, otherwise the status.
    pub fn code(&self) -> u16 {
        match *self {
            Message::CmdOther { command, .. } => command.code() as u16,
            Message::StatusAndError { status, error, .. } => match error {
                ErrorCode::None => status.code(),
                e => e.code()
            },
            Message::GpsEcef { status, .. } => status.code() as u16,
            Message::GpsNed { status, .. } => status.code() as u16,
            Message::Heartbeat { .. } | Message::Ack { .. } | Message::Barometer { .. } => 0
        }
    }

    /// Build the acknowledgement owed to the sender of this message, if it asked for one.
    pub fn ack_reply(&self) -> Option<Message> {
        match self.wants_ack() {
            true => Some(Message::Ack {
                msg_id: self.id().code(),
                status: self.code()
            }),
            false => None
        }
    }

    /// Serialise the payload of this message into its fixed little-endian layout.
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut p = vec![0u8; self.id().payload_len()];

        match *self {
            Message::Heartbeat { data } => p[0] = data,
            Message::Ack { msg_id, status } => {
                p[0] = msg_id;
                LittleEndian::write_u16(&mut p[1..3], status);
            },
            Message::CmdOther { ack, command } => {
                p[0] = ack as u8;
                p[1] = command.code();
            },
            Message::StatusAndError { ack, status, error } => {
                p[0] = ack as u8;
                LittleEndian::write_u16(&mut p[1..3], status.code());
                LittleEndian::write_u16(&mut p[3..5], error.code());
            },
            Message::GpsEcef { ack, status, x, y, z } => {
                p[0] = ack as u8;
                p[1] = status.code();
                write_f32x3(&mut p[2..14], [x, y, z]);
            },
            Message::GpsNed { ack, status, north, east, down } => {
                p[0] = ack as u8;
                p[1] = status.code();
                write_f32x3(&mut p[2..14], [north, east, down]);
            },
            Message::Barometer { temperature_c, altitude } => {
                LittleEndian::write_f32(&mut p[0..4], temperature_c);
                LittleEndian::write_f32(&mut p[4..8], altitude);
            }
        }

        p
    }

    /// Parse the payload of a message with the given identifier.
    pub fn decode_payload(id: MsgId, p: &[u8]) -> Result<Self, PayloadError> {
        if p.len() != id.payload_len() {
            return Err(PayloadError::WrongLength {
                id,
                expected: id.payload_len(),
                found: p.len()
            })
        }

        let msg = match id {
            MsgId::Heartbeat => Message::Heartbeat { data: p[0] },
            MsgId::Ack => Message::Ack {
                msg_id: p[0],
                status: LittleEndian::read_u16(&p[1..3])
            },
            MsgId::CmdOther => Message::CmdOther {
                ack: p[0] != 0,
                command: Command::from_code(p[1])
                    .ok_or(invalid_code(id, "command", p[1] as u16))?
            },
            MsgId::StatusAndError => {
                let status = LittleEndian::read_u16(&p[1..3]);
                let error = LittleEndian::read_u16(&p[3..5]);
                Message::StatusAndError {
                    ack: p[0] != 0,
                    status: Status::from_code(status)
                        .ok_or(invalid_code(id, "status", status))?,
                    error: ErrorCode::from_code(error)
                        .ok_or(invalid_code(id, "error", error))?
                }
            },
            MsgId::GpsEcef => {
                let [x, y, z] = read_finite_f32x3(id, &p[2..14], ["x", "y", "z"])?;
                Message::GpsEcef {
                    ack: p[0] != 0,
                    status: EcefStatus::from_code(p[1])
                        .ok_or(invalid_code(id, "status", p[1] as u16))?,
                    x, y, z
                }
            },
            MsgId::GpsNed => {
                let [north, east, down] = read_finite_f32x3(
                    id,
                    &p[2..14],
                    ["north", "east", "down"]
                )?;
                Message::GpsNed {
                    ack: p[0] != 0,
                    status: NedStatus::from_code(p[1])
                        .ok_or(invalid_code(id, "status", p[1] as u16))?,
                    north, east, down
                }
            },
            MsgId::Barometer => Message::Barometer {
                temperature_c: read_finite_f32(id, &p[0..4], "temperature_c")?,
                altitude: read_finite_f32(id, &p[4..8], "altitude")?
            }
        };

        Ok(msg)
    }

    /// A message of the given type with every field zeroed or at its first code.
    pub fn default_of(id: MsgId) -> Self {
        match id {
            MsgId::Heartbeat => Message::Heartbeat { data: 0 },
            MsgId::Ack => Message::Ack { msg_id: 0, status: 0 },
            MsgId::CmdOther => Message::CmdOther { ack: false, command: Command::ResetBoat },
            MsgId::StatusAndError => Message::StatusAndError {
                ack: false,
                status: Status::None,
                error: ErrorCode::None
            },
            MsgId::GpsEcef => Message::GpsEcef {
                ack: false,
                status: EcefStatus::Origin,
                x: 0.0,
                y: 0.0,
                z: 0.0
            },
            MsgId::GpsNed => Message::GpsNed {
                ack: false,
                status: NedStatus::SetStation,
                north: 0.0,
                east: 0.0,
                down: 0.0
            },
            MsgId::Barometer => Message::Barometer { temperature_c: 0.0, altitude: 0.0 }
        }
    }
}

impl mavlink::Message for Message {
    fn message_id(&self) -> u32 {
        self.id().code() as u32
    }

    fn message_name(&self) -> &'static str {
        self.id().name()
    }

    fn ser(&self, _version: MavlinkVersion, bytes: &mut [u8]) -> usize {
        let payload = self.encode_payload();
        bytes[..payload.len()].copy_from_slice(&payload);
        payload.len()
    }

    fn parse(
        _version: MavlinkVersion,
        msgid: u32,
        payload: &[u8]
    ) -> Result<Self, ParserError> {
        let id = msg_id_from_u32(msgid)
            .ok_or(ParserError::UnknownMessage { id: msgid })?;

        Message::decode_payload(id, payload).map_err(|e| match e {
            PayloadError::WrongLength { found, .. } => ParserError::InvalidFlag {
                flag_type: "payload length",
                value: found as u32
            },
            PayloadError::InvalidCode { field, code, .. } => ParserError::InvalidEnum {
                enum_type: field,
                value: code as u32
            },
            PayloadError::NonFinite { field, .. } => ParserError::InvalidFlag {
                flag_type: field,
                value: 0
            }
        })
    }

    fn message_id_from_name(name: &str) -> Result<u32, &'static str> {
        ALL_MSG_IDS
            .iter()
            .find(|id| id.name() == name)
            .map(|id| id.code() as u32)
            .ok_or("Unknown message name")
    }

    fn default_message_from_id(id: u32) -> Result<Self, &'static str> {
        msg_id_from_u32(id)
            .map(Message::default_of)
            .ok_or("Unknown message id")
    }

    fn extra_crc(id: u32) -> u8 {
        msg_id_from_u32(id).map(MsgId::crc_extra).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

const ALL_MSG_IDS: [MsgId; 7] = [
    MsgId::Heartbeat,
    MsgId::Ack,
    MsgId::CmdOther,
    MsgId::StatusAndError,
    MsgId::GpsEcef,
    MsgId::GpsNed,
    MsgId::Barometer,
];

fn msg_id_from_u32(id: u32) -> Option<MsgId> {
    u8::try_from(id).ok().and_then(MsgId::from_code)
}

fn invalid_code(id: MsgId, field: &'static str, code: u16) -> PayloadError {
    PayloadError::InvalidCode { id, field, code }
}

fn write_f32x3(buf: &mut [u8], values: [f32; 3]) {
    for (i, v) in values.iter().enumerate() {
        LittleEndian::write_f32(&mut buf[i * 4..(i + 1) * 4], *v);
    }
}

/// Read a float, rejecting NaN and infinities since they would reach the actuators.
fn read_finite_f32(id: MsgId, buf: &[u8], field: &'static str) -> Result<f32, PayloadError> {
    let v = LittleEndian::read_f32(buf);
    match v.is_finite() {
        true => Ok(v),
        false => Err(PayloadError::NonFinite { id, field })
    }
}

fn read_finite_f32x3(
    id: MsgId,
    buf: &[u8],
    fields: [&'static str; 3]
) -> Result<[f32; 3], PayloadError> {
    Ok([
        read_finite_f32(id, &buf[0..4], fields[0])?,
        read_finite_f32(id, &buf[4..8], fields[1])?,
        read_finite_f32(id, &buf[8..12], fields[2])?,
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_payload_layout() {
        let msg = Message::StatusAndError {
            ack: true,
            status: Status::Override,
            error: ErrorCode::NoOrigin
        };

        assert_eq!(msg.encode_payload(), vec![1, 4, 0, 1, 0]);

        let msg = Message::Ack { msg_id: 238, status: 0x0104 };
        assert_eq!(msg.encode_payload(), vec![238, 0x04, 0x01]);
    }

    #[test]
    fn test_invalid_codes() {
        assert_eq!(
            Message::decode_payload(MsgId::CmdOther, &[0, 99]),
            Err(PayloadError::InvalidCode { id: MsgId::CmdOther, field: "command", code: 99 })
        );
        assert!(Message::decode_payload(MsgId::GpsNed, &[0, 0, 0]).is_err());
        assert!(Message::decode_payload(MsgId::Heartbeat, &[]).is_err());
    }

    #[test]
    fn test_ack_reply_echoes_code() {
        let msg = Message::CmdOther { ack: true, command: Command::SaveStation };
        assert_eq!(
            msg.ack_reply(),
            Some(Message::Ack { msg_id: 238, status: 4 })
        );

        let msg = Message::GpsNed {
            ack: true,
            status: NedStatus::StartRescue,
            north: 1.0,
            east: 2.0,
            down: 0.0
        };
        assert_eq!(
            msg.ack_reply(),
            Some(Message::Ack { msg_id: 241, status: 2 })
        );

        assert_eq!(msg.with_ack(false).ack_reply(), None);
        assert_eq!(Message::Heartbeat { data: 1 }.ack_reply(), None);
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let mut p = Message::GpsNed {
            ack: true,
            status: NedStatus::SetStation,
            north: 1.0,
            east: 2.0,
            down: 0.0
        }.encode_payload();
        LittleEndian::write_f32(&mut p[2..6], f32::NAN);

        assert_eq!(
            Message::decode_payload(MsgId::GpsNed, &p),
            Err(PayloadError::NonFinite { id: MsgId::GpsNed, field: "north" })
        );

        let mut p = Message::GpsEcef {
            ack: false,
            status: EcefStatus::Error,
            x: 0.0,
            y: 0.0,
            z: 0.0
        }.encode_payload();
        LittleEndian::write_f32(&mut p[10..14], f32::INFINITY);

        assert_eq!(
            Message::decode_payload(MsgId::GpsEcef, &p),
            Err(PayloadError::NonFinite { id: MsgId::GpsEcef, field: "z" })
        );
    }

    #[test]
    fn test_dialect_lookups() {
        use mavlink::Message as _;

        assert_eq!(Message::message_id_from_name("GPS_NED"), Ok(241));
        assert!(Message::message_id_from_name("PARAM_SET").is_err());
        assert_eq!(
            Message::default_message_from_id(237),
            Ok(Message::Ack { msg_id: 0, status: 0 })
        );
        assert_eq!(Message::extra_crc(239), MsgId::StatusAndError.crc_extra());
        assert_eq!(Message::extra_crc(1000), 0);
    }

    #[test]
    fn test_bool_bytes() {
        let msg = Message::decode_payload(MsgId::CmdOther, &[7, 2]).unwrap();
        assert_eq!(msg, Message::CmdOther { ack: true, command: Command::ReturnStation });
    }
}
