//! One physical ISDV4 link and everything the logical devices on it share.

mod bringup;
mod parse;

pub use bringup::TABLET_KIND;

use std::path::Path;

use crate::link::{BaudRate, LinkController, SerialLink};
use crate::probe::{self, ProbedTablet, SYSFS_TTY};
use crate::protocol::{model, PKGLEN_TPCPEN};
use crate::state::{Channel, Clock, MonotonicClock};

/// Digitizer resolution in points per inch until a query says otherwise.
pub const DEFAULT_RESOLUTION: u32 = 2540;
pub const PROTOCOL_LEVEL: u8 = 4;

/// Axis maxima and resolutions learned during the query phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ranges {
    pub x_max: u32,
    pub y_max: u32,
    pub pressure_max: u32,
    pub tilt_x_max: u32,
    pub tilt_y_max: u32,
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub touch_x_max: u32,
    pub touch_y_max: u32,
    pub touch_resolution_x: u32,
    pub touch_resolution_y: u32,
}

/// Host-side settings for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub baud_rate: BaudRate,
    /// When false touch packets are consumed and dropped.
    pub touch_enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            baud_rate: BaudRate::B38400,
            touch_enabled: true,
        }
    }
}

pub struct Session<L> {
    link: LinkController<L>,
    /// Logical devices that queried and have not started yet.
    init_count: u32,
    pkt_len: usize,
    tablet_id: u8,
    ranges: Ranges,
    tilt_enabled: bool,
    touch_supported: bool,
    touch_enabled: bool,
    version: u32,
    channels: [Channel; 2],
    clock: Box<dyn Clock + Send>,
}

impl<L: SerialLink> Session<L> {
    pub fn new(link: L, options: SessionOptions) -> Self {
        Self {
            link: LinkController::new(link, options.baud_rate),
            init_count: 0,
            pkt_len: PKGLEN_TPCPEN,
            tablet_id: model::PEN_ONLY,
            ranges: Ranges {
                resolution_x: DEFAULT_RESOLUTION,
                resolution_y: DEFAULT_RESOLUTION,
                ..Default::default()
            },
            tilt_enabled: false,
            touch_supported: false,
            touch_enabled: options.touch_enabled,
            version: 0,
            channels: [Channel::default(); 2],
            clock: Box::new(MonotonicClock::new()),
        }
    }

    /// Replace the clock used for proximity edge timestamps.
    pub fn with_clock(mut self, clock: impl Clock + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// True if the link behaves like a serial line.
    pub fn detect(&self) -> bool {
        self.link.link().is_serial_line()
    }

    /// Guess the tablet model from `name` or the sysfs id of `device_path`.
    pub fn probe_capability_bits(&mut self, name: &str, device_path: &Path) -> ProbedTablet {
        self.probe_capability_bits_in(name, device_path, Path::new(SYSFS_TTY))
    }

    /// [`probe_capability_bits`](Self::probe_capability_bits) with an
    /// explicit sysfs tty directory.
    pub fn probe_capability_bits_in(
        &mut self,
        name: &str,
        device_path: &Path,
        sysfs_tty: &Path,
    ) -> ProbedTablet {
        if !self.detect() {
            return ProbedTablet::default();
        }
        let probed = probe::probe(name, device_path, sysfs_tty);
        if probed.tablet_id != 0 {
            self.tablet_id = probed.tablet_id;
        }
        probed
    }

    pub fn controller(&self) -> &LinkController<L> {
        &self.link
    }

    pub fn link(&self) -> &L {
        self.link.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.link.link_mut()
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.link.baud()
    }

    /// Packet length the framer currently works with.
    pub fn packet_length(&self) -> usize {
        self.pkt_len
    }

    pub fn tablet_id(&self) -> u8 {
        self.tablet_id
    }

    pub fn ranges(&self) -> &Ranges {
        &self.ranges
    }

    pub fn tilt_enabled(&self) -> bool {
        self.tilt_enabled
    }

    pub fn touch_supported(&self) -> bool {
        self.touch_supported
    }

    pub fn touch_enabled(&self) -> bool {
        self.touch_enabled
    }

    pub fn set_touch_enabled(&mut self, enabled: bool) {
        self.touch_enabled = enabled;
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn protocol_level(&self) -> u8 {
        PROTOCOL_LEVEL
    }

    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::ReplayLink;

    #[test]
    fn defaults_before_query() {
        let session = Session::new(ReplayLink::new(), SessionOptions::default());
        assert_eq!(session.packet_length(), PKGLEN_TPCPEN);
        assert_eq!(session.tablet_id(), model::PEN_ONLY);
        assert_eq!(session.ranges().resolution_x, DEFAULT_RESOLUTION);
        assert_eq!(session.ranges().resolution_y, DEFAULT_RESOLUTION);
        assert!(!session.tilt_enabled());
        assert!(session.touch_enabled());
        assert_eq!(session.protocol_level(), 4);
    }

    #[test]
    fn probe_needs_a_serial_line() {
        let mut link = ReplayLink::new();
        link.set_serial(false);
        let mut session = Session::new(link, SessionOptions::default());
        assert!(!session.detect());

        let probed = session.probe_capability_bits("WACf00c", Path::new("/dev/ttyS0"));
        assert_eq!(probed.tablet_id, 0);
        assert_eq!(session.tablet_id(), model::PEN_ONLY);
    }

    #[test]
    fn probe_sets_model() {
        let mut session = Session::new(ReplayLink::new(), SessionOptions::default());
        let probed = session.probe_capability_bits_in(
            "WACf00c",
            Path::new("/dev/ttyS0"),
            Path::new("/nonexistent"),
        );
        assert_eq!(probed.tablet_id, model::TWO_FINGER_PEN);
        assert_eq!(session.tablet_id(), model::TWO_FINGER_PEN);
    }
}
