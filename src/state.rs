//! Per-channel device state, the events handed to the host and the clock used
//! to stamp proximity edges.

use std::time::Instant;

/// Device id reported for the stylus tip.
pub const STYLUS_DEVICE_ID: u8 = 0x02;
/// Device id reported for touch contacts.
pub const TOUCH_DEVICE_ID: u8 = 0x03;
/// Device id reported for the eraser end.
pub const ERASER_DEVICE_ID: u8 = 0x0a;

/// Tip, side switch and eraser switch as reported in pen packets.
pub const BUTTON_TIP: u8 = 0x1;
pub const BUTTON_SIDE: u8 = 0x2;
pub const BUTTON_ERASER: u8 = 0x4;

/// Which logical device a state belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceType {
    #[default]
    None,
    Stylus,
    Eraser,
    Touch,
}

impl DeviceType {
    pub fn device_id(self) -> u8 {
        match self {
            DeviceType::None => 0,
            DeviceType::Stylus => STYLUS_DEVICE_ID,
            DeviceType::Eraser => ERASER_DEVICE_ID,
            DeviceType::Touch => TOUCH_DEVICE_ID,
        }
    }
}

/// Snapshot of one channel. This is both the working state the decoder fills
/// in and the record emitted to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub device_type: DeviceType,
    pub device_id: u8,
    pub x: u32,
    pub y: u32,
    pub pressure: u32,
    pub buttons: u8,
    pub proximity: bool,
    /// Touch only.
    pub capacity: u32,
    /// Relative wheel motion, cleared before every decode.
    pub rel_wheel: i32,
    /// Milliseconds from the session clock, set on proximity edges only.
    pub sample: Option<u32>,
}

impl DeviceState {
    /// Proximity-out for `device_type`, everything else cleared.
    pub fn out_of_proximity(device_type: DeviceType) -> Self {
        Self {
            device_type,
            device_id: device_type.device_id(),
            ..Default::default()
        }
    }

    pub(crate) fn reset_relative(&mut self) {
        self.rel_wheel = 0;
        self.sample = None;
    }
}

/// One of the two tracked contacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Channel {
    /// State being decoded into, carried over between packets.
    pub work: DeviceState,
    /// Last state handed to the host.
    pub last: DeviceState,
}

/// Receiver of decoded events.
pub trait EventSink {
    fn emit(&mut self, channel: usize, state: &DeviceState);
}

impl EventSink for Vec<(usize, DeviceState)> {
    fn emit(&mut self, channel: usize, state: &DeviceState) {
        self.push((channel, *state));
    }
}

/// Millisecond clock used for proximity edge timestamps.
pub trait Clock {
    fn millis(&self) -> u32;
}

/// [`Clock`] counting from its own creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn millis(&self) -> u32 {
        // wraps after ~49 days, like the host's own millisecond clock
        self.start.elapsed().as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_ids_follow_type() {
        assert_eq!(DeviceType::Stylus.device_id(), STYLUS_DEVICE_ID);
        assert_eq!(DeviceType::Eraser.device_id(), ERASER_DEVICE_ID);
        assert_eq!(DeviceType::Touch.device_id(), TOUCH_DEVICE_ID);
        assert_eq!(DeviceType::None.device_id(), 0);
    }

    #[test]
    fn proximity_out_keeps_only_identity() {
        let out = DeviceState::out_of_proximity(DeviceType::Touch);
        assert_eq!(out.device_type, DeviceType::Touch);
        assert_eq!(out.device_id, TOUCH_DEVICE_ID);
        assert!(!out.proximity);
        assert_eq!((out.x, out.y, out.buttons), (0, 0, 0));
    }

    #[test]
    fn vec_sink_keeps_order() {
        let mut sink: Vec<(usize, DeviceState)> = Vec::new();
        sink.emit(0, &DeviceState::default());
        sink.emit(1, &DeviceState::out_of_proximity(DeviceType::Touch));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].0, 0);
        assert_eq!(sink[1].0, 1);
    }
}
