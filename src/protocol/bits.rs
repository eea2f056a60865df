//! Bit-packed fields of the ISDV4 wire format.
//!
//! Every non-header byte carries seven payload bits, so wide values are spread
//! over several bytes. The layouts below are the ones the tablets emit and are
//! reproduced exactly, including the odd ones.

/// 16-bit coordinate: bits 15..9 in `hi`, bits 8..2 in `mid`, and the two low
/// bits borrowed from `shared` starting at bit `shift`.
#[inline]
pub fn coord16(hi: u8, mid: u8, shared: u8, shift: u32) -> u32 {
    (u32::from(hi) << 9) | (u32::from(mid) << 2) | ((u32::from(shared) >> shift) & 0x3)
}

/// 14-bit value: seven bits in each byte, high byte first.
#[inline]
pub fn septet14(hi: u8, lo: u8) -> u32 {
    (u32::from(hi) << 7) | u32::from(lo)
}

/// 10-bit pen pressure: bits 9..7 from the low three bits of `shared`, bits
/// 6..0 from `lo`.
#[inline]
pub fn pressure10(lo: u8, shared: u8) -> u32 {
    (u32::from(shared & 0x7) << 7) | u32::from(lo)
}

/// Maximum pressure as carried by the pen capability reply. Unlike
/// [`pressure10`] the three bits from `shared` are OR-ed in unshifted.
#[inline]
pub fn reply_pressure(lo: u8, shared: u8) -> u32 {
    u32::from(lo) | u32::from(shared & 0x7)
}

/// Inverse of [`coord16`]: `(hi, mid, low_two_bits)`.
#[inline]
pub fn split_coord16(value: u16) -> (u8, u8, u8) {
    ((value >> 9) as u8 & 0x7f, (value >> 2) as u8 & 0x7f, value as u8 & 0x3)
}

/// Inverse of [`septet14`]: `(hi, lo)`.
#[inline]
pub fn split_septet14(value: u16) -> (u8, u8) {
    ((value >> 7) as u8 & 0x7f, value as u8 & 0x7f)
}

/// Inverse of [`pressure10`]: `(lo, bits_for_shared)`.
#[inline]
pub fn split_pressure10(value: u16) -> (u8, u8) {
    (value as u8 & 0x7f, (value >> 7) as u8 & 0x7)
}
