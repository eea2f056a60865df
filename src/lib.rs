//! Host side of the ISDV4 serial tablet protocol: link bring-up, packet
//! framing and decoding into stylus, eraser and touch events.

pub mod error;
pub mod link;
pub mod probe;
pub mod protocol;
pub mod reader;
pub mod session;
pub mod state;

pub use error::{Isdv4Error, Result};
pub use link::{BaudRate, LinkController, ReplayLink, SerialLink, SerialPortLink};
pub use reader::PacketReader;
pub use session::{Ranges, Session, SessionOptions};
pub use state::{Channel, Clock, DeviceState, DeviceType, EventSink, MonotonicClock};
