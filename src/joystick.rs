//! Linux joystick interface (`/dev/input/jsN`)
//!
//! The legacy joystick API hands out fixed 8-byte records per read:
//!
//! - Bytes 0-3: timestamp in milliseconds (u32, host endian)
//! - Bytes 4-5: value (i16, host endian)
//! - Byte 6: event kind bitmask (BUTTON / AXIS, INIT on startup replay)
//! - Byte 7: button or axis number
//!
//! Button count comes from the `JSIOCGBUTTONS` ioctl, the display name from
//! `/sys/class/input/jsN/device/name`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Button pressed/released
pub const JS_EVENT_BUTTON: u8 = 0x01;
/// Axis moved
pub const JS_EVENT_AXIS: u8 = 0x02;
/// Synthetic initial-state event replayed when the device is opened
pub const JS_EVENT_INIT: u8 = 0x80;

/// Size of one record on the wire
pub const JS_EVENT_SIZE: usize = 8;

/// `_IOR('j', 0x12, __u8)`
const JSIOCGBUTTONS: u32 = 0x8001_6a12;

/// Name reported when sysfs has nothing for the slot
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// One decoded joystick record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsEvent {
    pub time_ms: u32,
    pub value: i16,
    pub kind: u8,
    pub number: u8,
}

impl JsEvent {
    pub fn from_bytes(bytes: &[u8; JS_EVENT_SIZE]) -> Self {
        Self {
            time_ms: u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            value: i16::from_ne_bytes([bytes[4], bytes[5]]),
            kind: bytes[6],
            number: bytes[7],
        }
    }

    pub fn to_bytes(&self) -> [u8; JS_EVENT_SIZE] {
        let mut out = [0u8; JS_EVENT_SIZE];
        out[0..4].copy_from_slice(&self.time_ms.to_ne_bytes());
        out[4..6].copy_from_slice(&self.value.to_ne_bytes());
        out[6] = self.kind;
        out[7] = self.number;
        out
    }

    /// Replayed initial state, never a real press
    pub fn is_init(&self) -> bool {
        self.kind & JS_EVENT_INIT != 0
    }

    pub fn is_button(&self) -> bool {
        self.kind & JS_EVENT_BUTTON != 0
    }

    /// A live press (not a release, not a replay) of `button`
    pub fn is_press_of(&self, button: u8) -> bool {
        !self.is_init() && self.is_button() && self.value == 1 && self.number == button
    }
}

/// Read a single record from `stream`.
///
/// `Ok(None)` means a short read, which carries no event. End of stream is
/// reported as `UnexpectedEof` so callers can stop watching the device.
pub fn read_event<R: Read>(stream: &mut R) -> io::Result<Option<JsEvent>> {
    let mut buf = [0u8; JS_EVENT_SIZE];
    match stream.read(&mut buf)? {
        0 => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "joystick stream closed",
        )),
        JS_EVENT_SIZE => Ok(Some(JsEvent::from_bytes(&buf))),
        n => {
            tracing::debug!("Discarding short joystick read ({} bytes)", n);
            Ok(None)
        }
    }
}

/// Conventional device node for slot `index`
pub fn device_path(device_dir: &Path, index: u32) -> PathBuf {
    device_dir.join(format!("js{}", index))
}

/// Open a joystick node read-only in non-blocking mode
pub fn open_nonblocking(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

/// Query the number of buttons via `JSIOCGBUTTONS`
pub fn button_count(file: &File) -> io::Result<u8> {
    let mut count: u8 = 0;
    let rc = unsafe { libc::ioctl(file.as_raw_fd(), JSIOCGBUTTONS as _, &mut count as *mut u8) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(count)
}

/// Display name from sysfs, `UNKNOWN` when the side channel is missing
pub fn display_name(sysfs_dir: &Path, node: &str) -> String {
    let name_path = sysfs_dir.join(node).join("device").join("name");
    match fs::read_to_string(&name_path) {
        Ok(name) => name.trim().to_string(),
        Err(_) => UNKNOWN_NAME.to_string(),
    }
}
