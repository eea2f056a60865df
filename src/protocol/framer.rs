//! Packet boundary detection.
//!
//! Only the first byte of a packet carries [`HEADER_BIT`]. Anything else is
//! either the tail of a packet we joined mid-way or a corrupted byte, and the
//! caller resynchronises by dropping the count returned here.

use super::HEADER_BIT;

/// Number of leading bytes in `data` that cannot start a packet.
pub fn skip_invalid_bytes(data: &[u8]) -> usize {
    data.iter().take_while(|&&b| b & HEADER_BIT == 0).count()
}

/// Check that `data[..pkt_len]` is one well-formed packet.
///
/// Returns 0 if it is, otherwise the number of bytes to skip before the next
/// attempt. The result never exceeds `pkt_len`. A buffer shorter than
/// `pkt_len` is validated over what is present.
pub fn validate_packet(data: &[u8], pkt_len: usize) -> usize {
    let window = &data[..pkt_len.min(data.len())];
    let Some(&first) = window.first() else {
        return 0;
    };

    if first & HEADER_BIT == 0 {
        let n = skip_invalid_bytes(window);
        log::warn!("missing header bit, skipping {} bytes", n);
        return n;
    }

    let n = 1 + skip_invalid_bytes(&window[1..]);
    if n != window.len() {
        log::warn!("bad data at {} v=0x{:x} l={}", n, window[n], pkt_len);
        return n;
    }

    0
}
