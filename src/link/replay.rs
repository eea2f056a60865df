//! In-memory [`SerialLink`] that answers commands from a script.
//!
//! Used to replay captured bring-up exchanges and to drive the session without
//! hardware.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::{BaudRate, SerialLink};

#[derive(Debug, Clone)]
struct Reply {
    command: u8,
    baud: BaudRate,
    bytes: Vec<u8>,
}

/// Scripted serial line.
///
/// Every time `command` is written while the line runs at `baud`, the
/// matching reply bytes become readable. Bytes queued with
/// [`queue_input`](Self::queue_input) are readable right away.
#[derive(Debug, Clone)]
pub struct ReplayLink {
    serial: bool,
    baud: BaudRate,
    replies: Vec<Reply>,
    input: VecDeque<u8>,
    read_chunk: Option<usize>,
    refuse_writes: bool,
    written: Vec<u8>,
    baud_changes: Vec<BaudRate>,
    settled: Vec<Duration>,
}

impl ReplayLink {
    pub fn new() -> Self {
        Self {
            serial: true,
            baud: BaudRate::default(),
            replies: Vec::new(),
            input: VecDeque::new(),
            read_chunk: None,
            refuse_writes: false,
            written: Vec::new(),
            baud_changes: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Answer `command` at `baud` with `bytes`.
    pub fn reply_to(&mut self, command: u8, baud: BaudRate, bytes: impl Into<Vec<u8>>) {
        self.replies.push(Reply {
            command,
            baud,
            bytes: bytes.into(),
        });
    }

    pub fn queue_input(&mut self, bytes: impl AsRef<[u8]>) {
        self.input.extend(bytes.as_ref());
    }

    /// Hand out at most `chunk` bytes per read.
    pub fn set_read_chunk(&mut self, chunk: usize) {
        self.read_chunk = Some(chunk.max(1));
    }

    /// Make every write report zero bytes written.
    pub fn refuse_writes(&mut self) {
        self.refuse_writes = true;
    }

    /// Pretend not to be a serial line.
    pub fn set_serial(&mut self, serial: bool) {
        self.serial = serial;
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn baud_changes(&self) -> &[BaudRate] {
        &self.baud_changes
    }

    pub fn settled(&self) -> &[Duration] {
        &self.settled
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

impl Default for ReplayLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for ReplayLink {
    fn is_serial_line(&self) -> bool {
        self.serial
    }

    fn set_baud_rate(&mut self, baud: BaudRate) -> io::Result<()> {
        self.baud = baud;
        self.baud_changes.push(baud);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.refuse_writes {
            return Ok(0);
        }
        self.written.extend_from_slice(data);
        for &command in data {
            for reply in &self.replies {
                if reply.command == command && reply.baud == self.baud {
                    self.input.extend(&reply.bytes);
                }
            }
        }
        Ok(data.len())
    }

    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.input.is_empty())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = self.read_chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(self.input.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn settle(&mut self, delay: Duration) {
        self.settled.push(delay);
    }
}
