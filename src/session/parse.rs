use super::Session;
use crate::link::SerialLink;
use crate::protocol::{
    packet_length_for, parse_coordinate_data, parse_touch_data, skip_invalid_bytes,
    validate_packet, CONTROL_BIT, PKGLEN_TPCPEN, TOUCH_CONTROL_BIT,
};
use crate::state::{
    DeviceState, DeviceType, EventSink, BUTTON_ERASER, ERASER_DEVICE_ID, STYLUS_DEVICE_ID,
    TOUCH_DEVICE_ID,
};

/// Events produced by one packet, in emission order.
type Pending = Vec<(usize, DeviceState)>;

impl<L: SerialLink> Session<L> {
    /// Decode one packet from the front of `data` and emit its events.
    ///
    /// Returns the number of bytes consumed: 0 when more data is needed,
    /// otherwise a whole packet or the garbage skipped to resynchronise.
    pub fn parse(&mut self, data: &[u8], sink: &mut impl EventSink) -> usize {
        let mut pending = Pending::with_capacity(3);
        let consumed = self.parse_packet(data, &mut pending);
        for (channel, state) in &pending {
            sink.emit(*channel, state);
        }
        consumed
    }

    fn parse_packet(&mut self, data: &[u8], pending: &mut Pending) -> usize {
        let skip = skip_invalid_bytes(data);
        if skip > 0 {
            log::trace!("skipping {} bytes without header bit", skip);
            return skip;
        }
        let Some(&first) = data.first() else {
            return 0;
        };

        let pkt_len = packet_length_for(first, self.tablet_id);
        if data.len() < pkt_len {
            return 0;
        }
        self.pkt_len = pkt_len;

        let last = self.channels[0].last;
        if first & TOUCH_CONTROL_BIT != 0 {
            let pen_in_control =
                last.device_id != TOUCH_DEVICE_ID && last.device_id != 0 && last.proximity;
            if pen_in_control || !self.touch_enabled {
                log::trace!("ignoring touch packet");
                return self.pkt_len;
            }
        } else if last.proximity && last.device_id == TOUCH_DEVICE_ID {
            // touch had control, let it go before the pen takes over
            let mut out = DeviceState::out_of_proximity(DeviceType::Touch);
            out.sample = Some(self.clock.millis());
            self.emit(0, out, pending);
        }

        if first & CONTROL_BIT != 0 {
            log::trace!("control packet 0x{:02x}", first);
            return self.pkt_len;
        }
        let skip = validate_packet(data, self.pkt_len);
        if skip > 0 {
            return skip;
        }

        self.channels[0].work.reset_relative();
        if self.pkt_len == PKGLEN_TPCPEN {
            self.decode_pen(data, pending)
        } else {
            self.decode_touch(data, pending)
        }
    }

    fn decode_touch(&mut self, data: &[u8], pending: &mut Pending) -> usize {
        let touch = match parse_touch_data(data, self.pkt_len) {
            Ok((touch, _)) => touch,
            Err(e) => {
                log::error!("failed to parse touch data: {}", e);
                return 0;
            }
        };
        let now = self.clock.millis();
        let last = self.channels[0].last;
        let last_second = self.channels[1].last;

        let ds = &mut self.channels[0].work;
        ds.x = touch.x;
        ds.y = touch.y;
        ds.capacity = touch.capacity;
        ds.proximity = touch.status;
        ds.buttons = u8::from(touch.status);
        ds.device_type = DeviceType::Touch;
        ds.device_id = TOUCH_DEVICE_ID;
        if ds.proximity != last.proximity {
            ds.sample = Some(now);
        }

        let mut channel = 0;
        if let Some(finger2) = touch.finger2 {
            if finger2.status || last_second.proximity {
                let first_finger = self.channels[0].work;
                if first_finger.proximity || last.proximity {
                    self.emit(0, first_finger, pending);
                }

                channel = 1;
                let ds = &mut self.channels[1].work;
                *ds = DeviceState {
                    device_type: DeviceType::Touch,
                    device_id: TOUCH_DEVICE_ID,
                    x: finger2.x,
                    y: finger2.y,
                    proximity: finger2.status,
                    ..Default::default()
                };
                if ds.proximity != last_second.proximity {
                    ds.sample = Some(now);
                }
            }
        }

        let state = self.channels[channel].work;
        log::trace!(
            "touch channel {} {} proximity",
            channel,
            if state.proximity { "in" } else { "out of" }
        );
        self.emit(channel, state, pending);
        self.pkt_len
    }

    fn decode_pen(&mut self, data: &[u8], pending: &mut Pending) -> usize {
        let coord = match parse_coordinate_data(data) {
            Ok((coord, _)) => coord,
            Err(e) => {
                log::error!("failed to parse coordinate data: {}", e);
                return 0;
            }
        };
        let last = self.channels[0].last;

        let mut ds = self.channels[0].work;
        ds.proximity = coord.proximity;
        ds.x = coord.x;
        ds.y = coord.y;
        ds.pressure = coord.pressure;
        ds.buttons = u8::from(coord.tip) | (u8::from(coord.side) << 1) | (u8::from(coord.eraser) << 2);
        if ds.proximity != last.proximity {
            ds.sample = Some(self.clock.millis());
        }

        let cur_type = if ds.buttons & BUTTON_ERASER != 0 {
            DeviceType::Eraser
        } else {
            DeviceType::Stylus
        };

        if !last.proximity && ds.proximity {
            ds.device_type = cur_type;
        } else if ds.buttons != 0
            && ds.proximity
            && ds.device_type == DeviceType::Eraser
            && cur_type != DeviceType::Eraser
        {
            // tip plus side switch on entry looked like the eraser
            let mut out = DeviceState::out_of_proximity(DeviceType::Eraser);
            out.sample = Some(self.clock.millis());
            self.emit(0, out, pending);
            ds.device_type = cur_type;
        }

        ds.device_id = if ds.device_type == DeviceType::Eraser {
            ERASER_DEVICE_ID
        } else {
            STYLUS_DEVICE_ID
        };

        // the eraser's press is derived from pressure by the host
        if ds.device_type == DeviceType::Eraser && ds.buttons & BUTTON_ERASER != 0 {
            ds.buttons = 0;
        }

        log::trace!("{:?} x={} y={} p={}", ds.device_type, ds.x, ds.y, ds.pressure);
        self.channels[0].work = ds;
        self.emit(0, ds, pending);
        self.pkt_len
    }

    fn emit(&mut self, channel: usize, state: DeviceState, pending: &mut Pending) {
        self.channels[channel].last = state;
        pending.push((channel, state));
    }
}
