use super::Session;
use crate::error::Result;
use crate::link::{QueryKind, SerialLink};
use crate::protocol::{
    model, parse_query, parse_touch_query, QueryReply, TouchQueryReply, PKGLEN_TOUCH2FG,
    PKGLEN_TOUCH93, PKGLEN_TOUCH9A,
};

/// Kind string reported by [`Session::init`].
pub const TABLET_KIND: &str = "ISDV4";

impl<L: SerialLink> Session<L> {
    /// Put the line at the configured speed.
    ///
    /// Returns the tablet kind and the version known so far.
    pub fn init(&mut self) -> Result<(&'static str, u32)> {
        log::debug!("initializing ISDV4 tablet");
        self.link.init()?;
        Ok((TABLET_KIND, self.version))
    }

    /// Query pen and touch capabilities.
    ///
    /// Only the first logical device on the link talks to the tablet; later
    /// calls return right away until [`start`](Self::start) has been called
    /// as many times.
    pub fn get_ranges(&mut self) -> Result<()> {
        self.init_count += 1;
        if self.init_count > 1 {
            log::debug!("ranges already queried ({} devices)", self.init_count);
            return Ok(());
        }
        log::debug!("getting ISDV4 ranges");

        let mut result = match self.link.query(QueryKind::Pen) {
            Ok(bytes) => {
                let (reply, _) = parse_query(&bytes).map_err(|e| {
                    log::error!("error while parsing ISDV4 query: {}", e);
                    e
                })?;
                self.apply_pen_reply(&reply);
                Ok(())
            }
            Err(e) => {
                log::warn!("pen query failed: {}", e);
                Err(e)
            }
        };

        // touch is optional, a missing answer just means pen only
        let bytes = match self.link.query(QueryKind::Touch) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("no touch reply: {}", e);
                log::info!("serial tablet id 0x{:X}", self.tablet_id);
                return result;
            }
        };
        let (reply, _) = parse_touch_query(&bytes).map_err(|e| {
            log::error!("error while parsing ISDV4 touch query: {}", e);
            e
        })?;
        if self.apply_touch_reply(&reply) {
            result = Ok(());
        }

        log::info!("serial tablet id 0x{:X}", self.tablet_id);
        result
    }

    /// Start sampling once the last logical device is ready.
    pub fn start(&mut self) -> Result<()> {
        self.init_count = self.init_count.saturating_sub(1);
        if self.init_count > 0 {
            log::debug!("{} devices still pending, not starting", self.init_count);
            return Ok(());
        }
        self.link.start_sampling()
    }

    /// Stop sampling.
    pub fn stop(&mut self) -> Result<()> {
        self.link.stop()
    }

    pub(crate) fn apply_pen_reply(&mut self, reply: &QueryReply) {
        self.ranges.pressure_max = reply.pressure_max;
        self.ranges.x_max = reply.x_max;
        self.ranges.y_max = reply.y_max;
        if reply.tilt_x_max != 0 && reply.tilt_y_max != 0 {
            self.ranges.tilt_x_max = reply.tilt_x_max.into();
            self.ranges.tilt_y_max = reply.tilt_y_max.into();
            self.tilt_enabled = true;
        }
        self.version = reply.version;

        // no pen digitizer, two-finger touch only
        if self.ranges.x_max == 0 || self.ranges.y_max == 0 {
            self.tablet_id = model::TWO_FINGER;
        }

        log::debug!(
            "pen speed={} maxX={} maxY={} maxZ={} resX={} resY={}",
            self.link.baud(),
            self.ranges.x_max,
            self.ranges.y_max,
            self.ranges.pressure_max,
            self.ranges.resolution_x,
            self.ranges.resolution_y
        );
    }

    /// Apply a touch reply. Returns false if its data id does not fit the
    /// sensor; the packet length and model picked from the sensor id are kept
    /// but the touch ranges are not taken over.
    pub(crate) fn apply_touch_reply(&mut self, reply: &TouchQueryReply) -> bool {
        match reply.sensor_id {
            // resistive touch, with and without pen
            0x00 | 0x02 => {
                self.pkt_len = PKGLEN_TOUCH93;
                self.tablet_id = model::RESISTIVE;
            }
            // capacitive touch and pen
            0x01 => {
                self.pkt_len = PKGLEN_TOUCH9A;
                self.tablet_id = model::CAPACITIVE;
            }
            0x03 | 0x04 => {
                self.pkt_len = PKGLEN_TOUCH9A;
                self.tablet_id = model::CAPACITIVE_TOUCH;
            }
            0x05 => {
                self.pkt_len = PKGLEN_TOUCH2FG;
                if self.tablet_id == model::PEN_ONLY {
                    self.tablet_id = model::TWO_FINGER_PEN;
                }
            }
            // packet length and model stay as they were, the ranges still apply
            other => log::warn!("unknown touch sensor id 0x{:x}", other),
        }
        self.touch_supported = true;

        let consistent = match reply.data_id {
            // single finger
            0x01 => matches!(
                self.tablet_id,
                model::RESISTIVE | model::CAPACITIVE | model::CAPACITIVE_TOUCH
            ),
            // two fingers
            0x03 => matches!(self.tablet_id, model::TWO_FINGER | model::TWO_FINGER_PEN),
            _ => true,
        };
        if !consistent {
            log::warn!(
                "tablet id(0x{:x}) mismatch with data id (0x{:02x})",
                self.tablet_id,
                reply.data_id
            );
            return false;
        }

        if reply.x_max != 0 || reply.y_max != 0 {
            self.ranges.touch_x_max = reply.x_max;
            self.ranges.touch_y_max = reply.y_max;
        } else if reply.panel_resolution != 0 {
            let max = 1u32 << u32::from(reply.panel_resolution).min(31);
            self.ranges.touch_x_max = max;
            self.ranges.touch_y_max = max;
        }
        if reply.panel_resolution != 0 {
            self.ranges.touch_resolution_x = 10;
            self.ranges.touch_resolution_y = 10;
        }
        self.version = reply.version;

        log::debug!(
            "touch speed={} maxTouchX={} maxTouchY={} TouchresX={} TouchresY={}",
            self.link.baud(),
            self.ranges.touch_x_max,
            self.ranges.touch_y_max,
            self.ranges.touch_resolution_x,
            self.ranges.touch_resolution_y
        );
        true
    }
}
