//! Serial link bring-up: speed negotiation, stop/query/start commands and
//! fixed-size replies with a bounded retry budget.

mod replay;
mod serial;

pub use replay::ReplayLink;
pub use serial::{detect, SerialPortLink};

use std::fmt;
use std::io;
use std::time::Duration;

use crate::error::{Isdv4Error, Result};
use crate::protocol::{CMD_QUERY, CMD_SAMPLING, CMD_STOP, CMD_TOUCH_QUERY, CONTROL_BIT, PKGLEN_TPCCTL};

/// Attempts per write and per blocking read.
pub const MAXTRY: usize = 3;
/// How long one read attempt waits for the line to become readable.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Quiet period the tablet needs after a stop command.
pub const STOP_SETTLE: Duration = Duration::from_millis(250);

/// The two line speeds ISDV4 tablets run at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BaudRate {
    /// Factory default some tablets fall back to after a reset.
    B19200,
    #[default]
    B38400,
}

impl BaudRate {
    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = Isdv4Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            other => Err(Isdv4Error::InvalidBaudRate(other)),
        }
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Which capability a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Pen,
    Touch,
}

impl QueryKind {
    pub fn command(self) -> u8 {
        match self {
            QueryKind::Pen => CMD_QUERY,
            QueryKind::Touch => CMD_TOUCH_QUERY,
        }
    }
}

/// Where the link is in its bring-up sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkState {
    #[default]
    Stopped,
    QuerySent,
    AwaitReply,
    Configured,
    Sampling,
}

/// Serial line operations the host provides.
pub trait SerialLink {
    /// True if the underlying descriptor is a serial line.
    fn is_serial_line(&self) -> bool;

    fn set_baud_rate(&mut self, baud: BaudRate) -> io::Result<()>;

    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Block until the line is readable. `Ok(false)` on timeout.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Block for `delay`.
    fn settle(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Drives the stop/query/start command sequence over a [`SerialLink`].
pub struct LinkController<L> {
    link: L,
    baud: BaudRate,
    state: LinkState,
}

impl<L: SerialLink> LinkController<L> {
    pub fn new(link: L, baud: BaudRate) -> Self {
        Self {
            link,
            baud,
            state: LinkState::Stopped,
        }
    }

    pub fn baud(&self) -> BaudRate {
        self.baud
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Put the line at the configured speed.
    pub fn init(&mut self) -> Result<()> {
        log::debug!("setting line speed to {}", self.baud);
        self.link.set_baud_rate(self.baud)?;
        Ok(())
    }

    /// Send a single command character, retrying short writes.
    pub fn write_command(&mut self, command: u8) -> Result<()> {
        for _ in 0..MAXTRY {
            match self.link.write(&[command]) {
                Ok(n) if n > 0 => return Ok(()),
                Ok(_) => {}
                Err(e) if is_transient(&e) => {}
                Err(e) => {
                    log::error!("write of command '{}' failed: {}", command as char, e);
                    return Err(e.into());
                }
            }
        }

        log::warn!(
            "failed to issue command '{}' after {} tries",
            command as char,
            MAXTRY
        );
        Err(Isdv4Error::WriteFailed {
            command: command as char,
            attempts: MAXTRY,
        })
    }

    /// Fill `buf` from the line. Reads that return data do not count against
    /// the retry budget; empty or timed out waits do.
    ///
    /// Returns the number of bytes read, which is less than `buf.len()` only
    /// when the budget ran out after a partial reply.
    pub fn wait_for_reply(&mut self, command: u8, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        let mut misses = 0;

        while filled < buf.len() && misses < MAXTRY {
            if !self.link.wait_readable(READ_TIMEOUT)? {
                misses += 1;
                continue;
            }
            match self.link.read(&mut buf[filled..]) {
                Ok(0) => misses += 1,
                Ok(n) => filled += n,
                Err(e) if is_transient(&e) => misses += 1,
                Err(e) => {
                    log::error!("read error while waiting for reply: {}", e);
                    return Err(e.into());
                }
            }
        }

        if filled == 0 {
            log::warn!("waited too long for answer (failed after {} tries)", MAXTRY);
            return Err(Isdv4Error::NoReply {
                command: command as char,
                attempts: MAXTRY,
            });
        }
        Ok(filled)
    }

    /// Stop sampling and wait for the tablet to go quiet.
    pub fn stop(&mut self) -> Result<()> {
        self.write_command(CMD_STOP)?;
        self.link.settle(STOP_SETTLE);
        self.state = LinkState::Stopped;
        Ok(())
    }

    /// Tell the tablet to start sending data.
    pub fn start_sampling(&mut self) -> Result<()> {
        self.write_command(CMD_SAMPLING)?;
        self.state = LinkState::Sampling;
        Ok(())
    }

    /// Query a capability reply.
    ///
    /// A pen query that gets no answer, or an answer without the control bit,
    /// at 38400 is retried once at 19200. Otherwise a reply without the control
    /// bit is read once more before giving up.
    pub fn query(&mut self, kind: QueryKind) -> Result<Vec<u8>> {
        let command = kind.command();
        log::debug!("querying tablet ('{}' at {})", command as char, self.baud);

        loop {
            self.stop()?;
            self.write_command(command)?;
            self.state = LinkState::QuerySent;

            let mut reply = [0u8; PKGLEN_TPCCTL];
            self.state = LinkState::AwaitReply;
            let mut len = match self.wait_for_reply(command, &mut reply) {
                Ok(len) => len,
                Err(Isdv4Error::NoReply { .. }) if self.can_fall_back(kind) => {
                    self.fall_back()?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if reply[0] & CONTROL_BIT == 0 {
                if self.can_fall_back(kind) {
                    self.fall_back()?;
                    continue;
                }
                // the first answer after a stop is sometimes stale
                log::debug!("reply without control bit, reading again");
                reply = [0u8; PKGLEN_TPCCTL];
                len = self.wait_for_reply(command, &mut reply)?;
                if reply[0] & CONTROL_BIT == 0 {
                    return Err(Isdv4Error::MalformedReply {
                        command: command as char,
                        first: reply[0],
                    });
                }
            }

            self.state = LinkState::Configured;
            return Ok(reply[..len].to_vec());
        }
    }

    fn can_fall_back(&self, kind: QueryKind) -> bool {
        kind == QueryKind::Pen && self.baud != BaudRate::B19200
    }

    fn fall_back(&mut self) -> Result<()> {
        log::info!("no usable reply at {}, trying {}", self.baud, BaudRate::B19200);
        self.baud = BaudRate::B19200;
        self.link.set_baud_rate(self.baud)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{QueryReply, TouchQueryReply};

    fn pen_reply() -> Vec<u8> {
        QueryReply {
            data_id: 0x02,
            x_max: 26202,
            y_max: 16325,
            pressure_max: 0x7f,
            ..Default::default()
        }
        .to_bytes()
        .to_vec()
    }

    #[test]
    fn baud_rate_accepts_only_two_speeds() {
        assert_eq!(BaudRate::try_from(19200).unwrap(), BaudRate::B19200);
        assert_eq!(BaudRate::try_from(38400).unwrap(), BaudRate::B38400);
        assert!(matches!(
            BaudRate::try_from(9600),
            Err(Isdv4Error::InvalidBaudRate(9600))
        ));
    }

    #[test]
    fn stop_writes_and_settles() {
        let mut ctl = LinkController::new(ReplayLink::new(), BaudRate::B38400);
        ctl.stop().unwrap();
        assert_eq!(ctl.link().written(), b"0");
        assert_eq!(ctl.link().settled(), &[STOP_SETTLE]);
        assert_eq!(ctl.state(), LinkState::Stopped);
    }

    #[test]
    fn query_returns_reply_and_configures() {
        let mut link = ReplayLink::new();
        link.reply_to(CMD_QUERY, BaudRate::B38400, pen_reply());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        let reply = ctl.query(QueryKind::Pen).unwrap();
        assert_eq!(reply, pen_reply());
        assert_eq!(ctl.state(), LinkState::Configured);
        assert_eq!(ctl.link().written(), b"0*");
    }

    #[test]
    fn silent_pen_query_falls_back_to_19200() {
        let mut link = ReplayLink::new();
        link.reply_to(CMD_QUERY, BaudRate::B19200, pen_reply());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        let reply = ctl.query(QueryKind::Pen).unwrap();
        assert_eq!(reply, pen_reply());
        assert_eq!(ctl.baud(), BaudRate::B19200);
        assert_eq!(ctl.link().baud_changes(), &[BaudRate::B19200]);
        assert_eq!(ctl.link().written(), b"0*0*");
    }

    #[test]
    fn malformed_pen_reply_falls_back_to_19200() {
        let mut garbage = pen_reply();
        garbage[0] &= !CONTROL_BIT;

        let mut link = ReplayLink::new();
        link.reply_to(CMD_QUERY, BaudRate::B38400, garbage);
        link.reply_to(CMD_QUERY, BaudRate::B19200, pen_reply());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        let reply = ctl.query(QueryKind::Pen).unwrap();
        assert_eq!(reply, pen_reply());
        assert_eq!(ctl.baud(), BaudRate::B19200);
        assert_eq!(ctl.link().baud_changes(), &[BaudRate::B19200]);
        assert_eq!(ctl.link().written(), b"0*0*");
        assert_eq!(ctl.link().pending_input(), 0);
    }

    #[test]
    fn silent_pen_query_at_19200_fails() {
        let mut ctl = LinkController::new(ReplayLink::new(), BaudRate::B19200);
        let err = ctl.query(QueryKind::Pen).unwrap_err();
        assert!(matches!(err, Isdv4Error::NoReply { command: '*', attempts: MAXTRY }));
        assert!(ctl.link().baud_changes().is_empty());
    }

    #[test]
    fn silent_touch_query_does_not_fall_back() {
        let mut ctl = LinkController::new(ReplayLink::new(), BaudRate::B38400);
        let err = ctl.query(QueryKind::Touch).unwrap_err();
        assert!(matches!(err, Isdv4Error::NoReply { command: '%', .. }));
        assert_eq!(ctl.baud(), BaudRate::B38400);
        assert_eq!(ctl.link().written(), b"0%");
    }

    #[test]
    fn garbage_touch_reply_is_read_again() {
        let good = TouchQueryReply {
            data_id: 0x01,
            sensor_id: 0x01,
            ..Default::default()
        }
        .to_bytes()
        .to_vec();
        let mut garbage = good.clone();
        garbage[0] = 0x81;

        let mut link = ReplayLink::new();
        link.reply_to(CMD_TOUCH_QUERY, BaudRate::B38400, [garbage, good.clone()].concat());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        assert_eq!(ctl.query(QueryKind::Touch).unwrap(), good);
    }

    #[test]
    fn garbage_twice_is_malformed() {
        let mut garbage = TouchQueryReply::default().to_bytes().to_vec();
        garbage[0] = 0x81;

        let mut link = ReplayLink::new();
        link.reply_to(CMD_TOUCH_QUERY, BaudRate::B38400, [garbage.clone(), garbage].concat());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        let err = ctl.query(QueryKind::Touch).unwrap_err();
        assert!(matches!(err, Isdv4Error::MalformedReply { command: '%', first: 0x81 }));
    }

    #[test]
    fn chunked_reply_is_reassembled() {
        let reply = pen_reply();
        let mut link = ReplayLink::new();
        link.set_read_chunk(4);
        link.reply_to(CMD_QUERY, BaudRate::B38400, reply.clone());
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        assert_eq!(ctl.query(QueryKind::Pen).unwrap(), reply);
    }

    #[test]
    fn failing_writes_exhaust_budget() {
        let mut link = ReplayLink::new();
        link.refuse_writes();
        let mut ctl = LinkController::new(link, BaudRate::B38400);

        let err = ctl.start_sampling().unwrap_err();
        assert!(matches!(err, Isdv4Error::WriteFailed { command: '1', attempts: MAXTRY }));
        assert_ne!(ctl.state(), LinkState::Sampling);
    }
}
