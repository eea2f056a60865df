//! Capability replies to the `*` (pen) and `%` (touch) queries.

use super::bits::{coord16, reply_pressure, septet14, split_coord16, split_septet14};
use super::{DecodeError, CONTROL_BIT, DATA_ID_MASK, HEADER_BIT, PKGLEN_TPCCTL};

/// Reply to the pen capability query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryReply {
    pub data_id: u8,
    pub x_max: u32,
    pub y_max: u32,
    pub pressure_max: u32,
    pub tilt_x_max: u8,
    pub tilt_y_max: u8,
    pub version: u32,
}

/// Reply to the touch capability query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchQueryReply {
    pub data_id: u8,
    /// Three bit sensor type, selects the touch packet variant.
    pub sensor_id: u8,
    /// Power of two used for the touch range when no explicit maxima are sent.
    pub panel_resolution: u8,
    pub x_max: u32,
    pub y_max: u32,
    pub capacity_resolution: u8,
    pub version: u32,
}

fn check_reply_header(buf: &[u8]) -> Result<(), DecodeError> {
    if buf.len() < PKGLEN_TPCCTL {
        return Err(DecodeError::Incomplete {
            needed: PKGLEN_TPCCTL,
            available: buf.len(),
        });
    }
    let first = buf[0];
    if first & HEADER_BIT == 0 || first & CONTROL_BIT == 0 {
        return Err(DecodeError::Malformed { first });
    }
    Ok(())
}

/// Decode a pen capability reply, returning it with the number of bytes used.
pub fn parse_query(buf: &[u8]) -> Result<(QueryReply, usize), DecodeError> {
    check_reply_header(buf)?;

    let reply = QueryReply {
        data_id: buf[0] & DATA_ID_MASK,
        x_max: coord16(buf[1], buf[2], buf[6], 5),
        y_max: coord16(buf[3], buf[4], buf[6], 3),
        pressure_max: reply_pressure(buf[5], buf[6]),
        tilt_y_max: buf[7],
        tilt_x_max: buf[8],
        version: septet14(buf[9], buf[10]),
    };
    Ok((reply, PKGLEN_TPCCTL))
}

/// Decode a touch capability reply, returning it with the number of bytes used.
pub fn parse_touch_query(buf: &[u8]) -> Result<(TouchQueryReply, usize), DecodeError> {
    check_reply_header(buf)?;

    let reply = TouchQueryReply {
        data_id: buf[0] & DATA_ID_MASK,
        sensor_id: buf[2] & 0x7,
        panel_resolution: buf[1],
        x_max: coord16(buf[3], buf[4], buf[2], 5),
        y_max: coord16(buf[5], buf[6], buf[2], 3),
        capacity_resolution: buf[7],
        version: septet14(buf[9], buf[10]),
    };
    Ok((reply, PKGLEN_TPCCTL))
}

impl QueryReply {
    /// Wire form of this reply.
    ///
    /// The reply layout only carries seven bits of pressure losslessly, so
    /// `pressure_max` is truncated to its low seven bits.
    pub fn to_bytes(&self) -> [u8; PKGLEN_TPCCTL] {
        let (x_hi, x_mid, x_lo) = split_coord16(self.x_max as u16);
        let (y_hi, y_mid, y_lo) = split_coord16(self.y_max as u16);
        let (v_hi, v_lo) = split_septet14(self.version as u16);
        [
            HEADER_BIT | CONTROL_BIT | (self.data_id & DATA_ID_MASK),
            x_hi,
            x_mid,
            y_hi,
            y_mid,
            self.pressure_max as u8 & 0x7f,
            (x_lo << 5) | (y_lo << 3),
            self.tilt_y_max & 0x7f,
            self.tilt_x_max & 0x7f,
            v_hi,
            v_lo,
        ]
    }
}

impl TouchQueryReply {
    /// Wire form of this reply.
    pub fn to_bytes(&self) -> [u8; PKGLEN_TPCCTL] {
        let (x_hi, x_mid, x_lo) = split_coord16(self.x_max as u16);
        let (y_hi, y_mid, y_lo) = split_coord16(self.y_max as u16);
        let (v_hi, v_lo) = split_septet14(self.version as u16);
        [
            HEADER_BIT | CONTROL_BIT | (self.data_id & DATA_ID_MASK),
            self.panel_resolution & 0x7f,
            (x_lo << 5) | (y_lo << 3) | (self.sensor_id & 0x7),
            x_hi,
            x_mid,
            y_hi,
            y_mid,
            self.capacity_resolution & 0x7f,
            0,
            v_hi,
            v_lo,
        ]
    }
}
