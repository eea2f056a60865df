//! Print decoded tablet events, optionally with the raw bytes they came from.
//! Run: isdv4-pad dump  to see both.

use isdv4_pad::link::READ_TIMEOUT;
use isdv4_pad::{DeviceState, DeviceType, EventSink, Isdv4Error, PacketReader, SerialLink, Session};

/// Sink that writes one line per event to stdout.
pub struct PrintSink {
    count: u64,
}

impl PrintSink {
    pub fn new() -> Self {
        Self { count: 0 }
    }
}

fn tool_name(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::None => "none",
        DeviceType::Stylus => "stylus",
        DeviceType::Eraser => "eraser",
        DeviceType::Touch => "touch",
    }
}

impl EventSink for PrintSink {
    fn emit(&mut self, channel: usize, state: &DeviceState) {
        self.count += 1;
        let mut line = format!(
            "{:6}  ch{} {:<6} id=0x{:02x} {} x={} y={} p={} buttons={:03b}",
            self.count,
            channel,
            tool_name(state.device_type),
            state.device_id,
            if state.proximity { "in " } else { "out" },
            state.x,
            state.y,
            state.pressure,
            state.buttons,
        );
        if state.device_type == DeviceType::Touch {
            line.push_str(&format!(" capacity={}", state.capacity));
        }
        if let Some(ms) = state.sample {
            line.push_str(&format!(" t={}ms", ms));
        }
        println!("{}", line);
    }
}

fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print events until the link fails.
pub fn run_events<L: SerialLink>(session: &mut Session<L>) -> Result<(), Isdv4Error> {
    let mut reader = PacketReader::new();
    let mut sink = PrintSink::new();
    loop {
        reader.read_from_link(session, &mut sink)?;
    }
}

/// Like [`run_events`], with every chunk read printed in hex first.
pub fn run_dump<L: SerialLink>(session: &mut Session<L>) -> Result<(), Isdv4Error> {
    eprintln!("Dumping tablet data (Ctrl+C to stop):\n");
    let mut reader = PacketReader::new();
    let mut sink = PrintSink::new();
    let mut buf = [0u8; 64];
    loop {
        if !session.link_mut().wait_readable(READ_TIMEOUT)? {
            continue;
        }
        let n = match session.link_mut().read(&mut buf) {
            Ok(0) => return Err(Isdv4Error::Disconnected),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        };
        println!("        raw {}", hex(&buf[..n]));
        reader.push(&buf[..n], session, &mut sink);
    }
}
