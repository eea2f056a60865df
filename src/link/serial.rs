//! [`SerialLink`] over a real tty.

use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};

use super::{BaudRate, SerialLink};
use crate::error::Result;

/// How long a read blocks once `wait_readable` said data is there.
const READ_POLL: Duration = Duration::from_millis(10);

/// True if `fd` is a serial line this protocol can run on.
#[cfg(target_os = "linux")]
pub fn detect(fd: RawFd) -> bool {
    // room for struct serial_struct, which we never look into
    let mut ser = [0u64; 16];
    // SAFETY: TIOCGSERIAL writes at most sizeof(struct serial_struct) bytes,
    // well within `ser`.
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGSERIAL, ser.as_mut_ptr()) };
    rc != -1
}

#[cfg(not(target_os = "linux"))]
pub fn detect(fd: RawFd) -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(fd) == 1 }
}

pub struct SerialPortLink {
    port: TTYPort,
}

impl SerialPortLink {
    /// Open `path` raw, 8N1 without flow control, at `baud`.
    pub fn open(path: &str, baud: BaudRate) -> Result<Self> {
        log::debug!("opening {} at {}", path, baud);
        let port = serialport::new(path, baud.as_u32())
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_POLL)
            .open_native()?;
        Ok(Self { port })
    }
}

impl AsRawFd for SerialPortLink {
    fn as_raw_fd(&self) -> RawFd {
        self.port.as_raw_fd()
    }
}

impl SerialLink for SerialPortLink {
    fn is_serial_line(&self) -> bool {
        detect(self.port.as_raw_fd())
    }

    fn set_baud_rate(&mut self, baud: BaudRate) -> io::Result<()> {
        self.port.set_baud_rate(baud.as_u32()).map_err(io::Error::from)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.port.write(data)?;
        self.port.flush()?;
        Ok(n)
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.port.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        // SAFETY: one valid pollfd for the duration of the call.
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        match rc {
            -1 => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(false)
                } else {
                    Err(err)
                }
            }
            0 => Ok(false),
            _ => Ok(pfd.revents & libc::POLLIN != 0),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}
