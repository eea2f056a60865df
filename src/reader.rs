//! Buffered packet reader. A packet torn across two reads is kept and
//! completed by the next one.

use std::io;

use crate::error::{Isdv4Error, Result};
use crate::link::{SerialLink, READ_TIMEOUT};
use crate::session::Session;
use crate::state::EventSink;

pub const BUFFER_SIZE: usize = 256;

pub struct PacketReader {
    buffer: [u8; BUFFER_SIZE],
    len: usize,
}

impl PacketReader {
    pub fn new() -> Self {
        Self {
            buffer: [0; BUFFER_SIZE],
            len: 0,
        }
    }

    /// Bytes waiting for the rest of their packet.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Feed bytes received by other means through the session.
    pub fn push<L: SerialLink>(
        &mut self,
        mut data: &[u8],
        session: &mut Session<L>,
        sink: &mut impl EventSink,
    ) {
        while !data.is_empty() {
            let n = data.len().min(BUFFER_SIZE - self.len);
            self.buffer[self.len..self.len + n].copy_from_slice(&data[..n]);
            self.len += n;
            data = &data[n..];
            self.drain(session, sink);
        }
    }

    /// Wait for the session's link to become readable, read what is there
    /// and decode every complete packet.
    ///
    /// Returns the number of bytes read, 0 when the wait timed out.
    pub fn read_from_link<L: SerialLink>(
        &mut self,
        session: &mut Session<L>,
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        if !session.link_mut().wait_readable(READ_TIMEOUT)? {
            return Ok(0);
        }

        let n = match session.link_mut().read(&mut self.buffer[self.len..]) {
            Ok(0) => return Err(Isdv4Error::Disconnected),
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(0)
            }
            Err(e) => {
                log::error!("error reading tablet: {}", e);
                return Err(Isdv4Error::Disconnected);
            }
        };
        self.len += n;
        self.drain(session, sink);
        Ok(n)
    }

    fn drain<L: SerialLink>(&mut self, session: &mut Session<L>, sink: &mut impl EventSink) {
        let mut pos = 0;
        while self.len - pos >= session.packet_length() {
            let consumed = session.parse(&self.buffer[pos..self.len], sink);
            if consumed == 0 {
                log::debug!("incomplete packet, waiting for more data");
                break;
            }
            pos += consumed;
        }

        if pos > 0 {
            self.buffer.copy_within(pos..self.len, 0);
            self.len -= pos;
        }
        // a full buffer that parses to nothing can never make progress
        if self.len == BUFFER_SIZE {
            log::warn!("discarding {} unparseable bytes", self.len);
            self.len = 0;
        }
    }
}

impl Default for PacketReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::ReplayLink;
    use crate::protocol::{CoordinateData, PKGLEN_TPCPEN};
    use crate::session::SessionOptions;
    use crate::state::DeviceState;

    fn pen(x: u32) -> [u8; PKGLEN_TPCPEN] {
        CoordinateData {
            proximity: true,
            x,
            y: 10,
            ..Default::default()
        }
        .to_bytes()
    }

    fn session() -> Session<ReplayLink> {
        Session::new(ReplayLink::new(), SessionOptions::default())
    }

    #[test]
    fn torn_packet_is_kept_for_the_next_push() {
        let mut s = session();
        let mut reader = PacketReader::new();
        let mut events: Vec<(usize, DeviceState)> = Vec::new();
        let packet = pen(100);

        reader.push(&packet[..5], &mut s, &mut events);
        assert!(events.is_empty());
        assert_eq!(reader.buffered(), &packet[..5]);

        reader.push(&packet[5..], &mut s, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.x, 100);
        assert!(reader.buffered().is_empty());
    }

    #[test]
    fn several_packets_in_one_push() {
        let mut s = session();
        let mut reader = PacketReader::new();
        let mut events: Vec<(usize, DeviceState)> = Vec::new();
        let data = [pen(1), pen(2), pen(3)].concat();

        reader.push(&data[..20], &mut s, &mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(reader.buffered().len(), 2);

        reader.push(&data[20..], &mut s, &mut events);
        let xs: Vec<u32> = events.iter().map(|(_, e)| e.x).collect();
        assert_eq!(xs, vec![1, 2, 3]);
    }

    #[test]
    fn garbage_between_packets_is_skipped() {
        let mut s = session();
        let mut reader = PacketReader::new();
        let mut events: Vec<(usize, DeviceState)> = Vec::new();
        let data = [&pen(1)[..], &[0x01, 0x02, 0x03], &pen(2)[..]].concat();

        reader.push(&data, &mut s, &mut events);
        assert_eq!(events.len(), 2);
        assert!(reader.buffered().is_empty());
    }

    #[test]
    fn link_bytes_are_read_and_decoded() {
        let mut link = ReplayLink::new();
        link.set_read_chunk(4);
        link.queue_input(pen(7));
        let mut s = Session::new(link, SessionOptions::default());
        let mut reader = PacketReader::new();
        let mut events: Vec<(usize, DeviceState)> = Vec::new();

        let mut total = 0;
        while total < PKGLEN_TPCPEN {
            total += reader.read_from_link(&mut s, &mut events).unwrap();
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.x, 7);
        assert_eq!(reader.read_from_link(&mut s, &mut events).unwrap(), 0);
    }

    #[test]
    fn long_garbage_run_does_not_stall() {
        let mut s = session();
        let mut reader = PacketReader::new();
        let mut events: Vec<(usize, DeviceState)> = Vec::new();
        let data = [vec![0x11; 600], pen(9).to_vec()].concat();

        reader.push(&data, &mut s, &mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1.x, 9);
    }
}
