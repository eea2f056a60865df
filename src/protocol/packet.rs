//! Live data packets: pen coordinates and single/two-finger touch.

use super::bits::{coord16, pressure10, septet14, split_coord16, split_pressure10, split_septet14};
use super::{DecodeError, HEADER_BIT, PKGLEN_TOUCH2FG, PKGLEN_TOUCH9A, PKGLEN_TPCPEN, TOUCH_CONTROL_BIT};

/// Pen coordinate packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinateData {
    pub proximity: bool,
    pub tip: bool,
    pub side: bool,
    pub eraser: bool,
    pub x: u32,
    pub y: u32,
    pub pressure: u32,
    pub tilt_x: u8,
    pub tilt_y: u8,
}

/// One touch contact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerData {
    pub status: bool,
    pub x: u32,
    pub y: u32,
}

/// Touch packet. `capacity` is only sent by capacitive sensors and `finger2`
/// only exists in two-finger packets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchData {
    pub status: bool,
    pub x: u32,
    pub y: u32,
    pub capacity: u32,
    pub finger2: Option<FingerData>,
}

/// Decode a pen coordinate packet.
pub fn parse_coordinate_data(buf: &[u8]) -> Result<(CoordinateData, usize), DecodeError> {
    if buf.len() < PKGLEN_TPCPEN {
        return Err(DecodeError::Incomplete {
            needed: PKGLEN_TPCPEN,
            available: buf.len(),
        });
    }
    let first = buf[0];
    if first & HEADER_BIT == 0 || first & TOUCH_CONTROL_BIT != 0 {
        return Err(DecodeError::Malformed { first });
    }

    let coord = CoordinateData {
        proximity: (first >> 5) & 0x1 != 0,
        tip: first & 0x1 != 0,
        side: (first >> 1) & 0x1 != 0,
        eraser: (first >> 2) & 0x1 != 0,
        x: coord16(buf[1], buf[2], buf[6], 5),
        y: coord16(buf[3], buf[4], buf[6], 3),
        pressure: pressure10(buf[5], buf[6]),
        tilt_x: buf[7],
        tilt_y: buf[8],
    };
    Ok((coord, PKGLEN_TPCPEN))
}

/// Decode a touch packet of the variant selected by `pkt_len`.
pub fn parse_touch_data(buf: &[u8], pkt_len: usize) -> Result<(TouchData, usize), DecodeError> {
    if buf.len() < pkt_len {
        return Err(DecodeError::Incomplete {
            needed: pkt_len,
            available: buf.len(),
        });
    }
    let first = buf[0];
    if first & HEADER_BIT == 0 || first & TOUCH_CONTROL_BIT == 0 {
        return Err(DecodeError::Malformed { first });
    }

    let mut touch = TouchData {
        status: first & 0x1 != 0,
        x: septet14(buf[1], buf[2]),
        y: septet14(buf[3], buf[4]),
        ..Default::default()
    };
    if pkt_len == PKGLEN_TOUCH9A {
        touch.capacity = septet14(buf[5], buf[6]);
    }
    if pkt_len == PKGLEN_TOUCH2FG {
        touch.finger2 = Some(FingerData {
            status: first & 0x2 != 0,
            x: septet14(buf[7], buf[8]),
            y: septet14(buf[9], buf[10]),
        });
    }
    Ok((touch, pkt_len))
}

impl CoordinateData {
    /// Wire form of this packet.
    pub fn to_bytes(&self) -> [u8; PKGLEN_TPCPEN] {
        let (x_hi, x_mid, x_lo) = split_coord16(self.x as u16);
        let (y_hi, y_mid, y_lo) = split_coord16(self.y as u16);
        let (p_lo, p_hi) = split_pressure10(self.pressure as u16);
        let first = HEADER_BIT
            | (u8::from(self.proximity) << 5)
            | (u8::from(self.eraser) << 2)
            | (u8::from(self.side) << 1)
            | u8::from(self.tip);
        [
            first,
            x_hi,
            x_mid,
            y_hi,
            y_mid,
            p_lo,
            (x_lo << 5) | (y_lo << 3) | p_hi,
            self.tilt_x & 0x7f,
            self.tilt_y & 0x7f,
        ]
    }
}

impl TouchData {
    /// Wire form of this packet as a `pkt_len` byte touch packet.
    pub fn to_bytes(&self, pkt_len: usize) -> Vec<u8> {
        let mut out = vec![0u8; pkt_len];
        out[0] = HEADER_BIT | TOUCH_CONTROL_BIT | u8::from(self.status);
        (out[1], out[2]) = split_septet14(self.x as u16);
        (out[3], out[4]) = split_septet14(self.y as u16);
        if pkt_len == PKGLEN_TOUCH9A {
            (out[5], out[6]) = split_septet14(self.capacity as u16);
        }
        if pkt_len == PKGLEN_TOUCH2FG {
            if let Some(finger2) = self.finger2 {
                out[0] |= u8::from(finger2.status) << 1;
                (out[7], out[8]) = split_septet14(finger2.x as u16);
                (out[9], out[10]) = split_septet14(finger2.y as u16);
            }
        }
        out
    }
}
