//! ISDV4 wire format: bit conventions, packet lengths and the command set.

pub mod bits;
pub mod framer;
pub mod packet;
pub mod query;

pub use framer::{skip_invalid_bytes, validate_packet};
pub use packet::{parse_coordinate_data, parse_touch_data, CoordinateData, FingerData, TouchData};
pub use query::{parse_query, parse_touch_query, QueryReply, TouchQueryReply};

/// Set on the first byte of every packet and clear on all the others.
pub const HEADER_BIT: u8 = 0x80;
/// Marks a control/query frame instead of live data.
pub const CONTROL_BIT: u8 = 0x40;
/// Marks a packet originating from the touch sensor.
pub const TOUCH_CONTROL_BIT: u8 = 0x10;
pub const DATA_ID_MASK: u8 = 0x3f;

/// Reply to either capability query.
pub const PKGLEN_TPCCTL: usize = 11;
/// Pen coordinate packet.
pub const PKGLEN_TPCPEN: usize = 9;
/// Resistive single touch.
pub const PKGLEN_TOUCH93: usize = 5;
/// Capacitive single touch, carries a capacity field.
pub const PKGLEN_TOUCH9A: usize = 7;
/// Two-finger touch.
pub const PKGLEN_TOUCH2FG: usize = 13;

pub const CMD_QUERY: u8 = b'*';
pub const CMD_TOUCH_QUERY: u8 = b'%';
pub const CMD_STOP: u8 = b'0';
pub const CMD_SAMPLING: u8 = b'1';

/// Error returned by the fixed-layout decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not enough bytes buffered yet; not a protocol violation.
    #[error("need {needed} bytes, have {available}")]
    Incomplete { needed: usize, available: usize },
    /// Header or control bits are wrong for this decoder.
    #[error("unexpected control bits in first byte 0x{first:02x}")]
    Malformed { first: u8 },
}

/// Tablet model identifiers as reported by the query phase and the probe.
pub mod model {
    /// Pen only.
    pub const PEN_ONLY: u8 = 0x90;
    /// Resistive touch, five byte packets.
    pub const RESISTIVE: u8 = 0x93;
    /// Capacitive touch and pen.
    pub const CAPACITIVE: u8 = 0x9a;
    /// Capacitive touch.
    pub const CAPACITIVE_TOUCH: u8 = 0x9f;
    /// Two-finger touch without pen.
    pub const TWO_FINGER: u8 = 0xe2;
    /// Two-finger touch with pen.
    pub const TWO_FINGER_PEN: u8 = 0xe3;
}

/// Packet length a data packet starting with `first` has on a tablet of model
/// `tablet_id`.
pub fn packet_length_for(first: u8, tablet_id: u8) -> usize {
    if first & TOUCH_CONTROL_BIT == 0 {
        return PKGLEN_TPCPEN;
    }
    match tablet_id {
        model::CAPACITIVE | model::CAPACITIVE_TOUCH => PKGLEN_TOUCH9A,
        model::TWO_FINGER | model::TWO_FINGER_PEN => PKGLEN_TOUCH2FG,
        _ => PKGLEN_TOUCH93,
    }
}
