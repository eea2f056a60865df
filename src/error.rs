use std::io;

use crate::protocol::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum Isdv4Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("failed to issue command '{command}' after {attempts} tries")]
    WriteFailed { command: char, attempts: usize },

    #[error("no reply to command '{command}' after {attempts} tries")]
    NoReply { command: char, attempts: usize },

    #[error("reply to command '{command}' has no control bit (first byte 0x{first:02x})")]
    MalformedReply { command: char, first: u8 },

    #[error("error while parsing reply: {0}")]
    Decode(#[from] DecodeError),

    #[error("illegal speed value {0} (must be 19200 or 38400)")]
    InvalidBaudRate(u32),

    #[error("link closed")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, Isdv4Error>;
