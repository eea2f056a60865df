//! Tablet model guess from the device name or the tty's sysfs id, before any
//! query has been sent.
//!
//! Wacom serial digitizers identify as `WACf<hex id>`. Only the touch
//! capability is known this way; capacitive variants are told apart later by
//! the touch query.

use std::fs;
use std::path::Path;

use crate::protocol::model;

pub const SYSFS_TTY: &str = "/sys/class/tty";

/// Tools a probed tablet can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tools {
    pub pen: bool,
    pub eraser: bool,
    pub double_tap: bool,
    pub triple_tap: bool,
}

/// Result of [`probe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbedTablet {
    /// Serial id found, 0 when none was.
    pub serial_id: u32,
    /// Model id, 0 when the id maps to none.
    pub tablet_id: u8,
    pub tools: Tools,
}

/// Parse `WACf<hex>` (case of the hex digits does not matter).
pub fn parse_wacf_id(s: &str) -> Option<u32> {
    let hex = s.trim().strip_prefix("WACf")?;
    let end = hex
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(hex.len());
    u32::from_str_radix(&hex[..end], 16).ok()
}

/// Map a serial id to a model and tool set.
pub fn classify(serial_id: u32) -> ProbedTablet {
    let mut tools = Tools {
        pen: true,
        eraser: true,
        double_tap: serial_id > 0x7,
        triple_tap: serial_id > 0xa,
    };
    if serial_id == 0x10 {
        tools.pen = false;
        tools.eraser = false;
    }

    let tablet_id = match serial_id {
        0x0..=0x7 => model::PEN_ONLY,
        0x8..=0xa => model::RESISTIVE,
        0xb..=0xe => model::TWO_FINGER_PEN,
        0x10 => model::TWO_FINGER,
        _ => 0,
    };

    ProbedTablet {
        serial_id,
        tablet_id,
        tools,
    }
}

/// Read the `WACf` id of the tty under `device_path` from `sysfs_tty`.
fn sysfs_id(device_path: &Path, sysfs_tty: &Path) -> Option<u32> {
    let tty = device_path.file_name()?.to_str()?;
    if !tty.starts_with("tty") {
        return None;
    }
    let id_path = sysfs_tty.join(tty).join("device").join("id");
    let content = fs::read_to_string(&id_path).ok()?;
    log::debug!("read {} from {}", content.trim(), id_path.display());
    parse_wacf_id(&content)
}

/// Guess the tablet from `name`, falling back to the sysfs id of
/// `device_path`. Unknown tablets classify as id 0, a pen-only tablet.
pub fn probe(name: &str, device_path: &Path, sysfs_tty: &Path) -> ProbedTablet {
    let serial_id = parse_wacf_id(name)
        .or_else(|| sysfs_id(device_path, sysfs_tty))
        .unwrap_or(0);
    let probed = classify(serial_id);
    log::debug!(
        "probed serial id 0x{:x} -> tablet id 0x{:x}",
        probed.serial_id,
        probed.tablet_id
    );
    probed
}
