//! Bounded wait for the operator before configs are rewritten
//!
//! On a terminal any single key counts: canonical mode and echo are switched
//! off for the wait and restored afterwards. When stdin is not a terminal a
//! full line (or EOF) is read instead.

use crate::poll::{self, Readiness};
use std::io::{self, BufRead, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;
use tracing::debug;

/// Terminal attributes restored on drop
struct RawModeGuard {
    fd: RawFd,
    saved: libc::termios,
}

impl RawModeGuard {
    /// `None` when `fd` is not a terminal
    fn enter(fd: RawFd) -> io::Result<Option<Self>> {
        // SAFETY: termios is plain data, tcgetattr fills it in
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            debug!("stdin is not a terminal: {}", io::Error::last_os_error());
            return Ok(None);
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Some(Self { fd, saved }))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetattr(self.fd, libc::TCSANOW, &self.saved);
        }
    }
}

/// Wait up to `timeout` for the operator.
///
/// Returns `true` if a key was pressed (a line on non-terminal stdin),
/// `false` on timeout or when stdin is closed.
pub fn wait_for_key(timeout: Duration) -> io::Result<bool> {
    let stdin = io::stdin();
    let fd = stdin.as_raw_fd();
    let guard = RawModeGuard::enter(fd)?;

    let ready = poll::wait_readable(&[fd], timeout)?;
    if !matches!(ready.first(), Some((_, Readiness::Readable))) {
        return Ok(false);
    }

    let mut handle = stdin.lock();
    if guard.is_some() {
        let mut key = [0u8; 1];
        Ok(handle.read(&mut key)? > 0)
    } else {
        let mut line = String::new();
        Ok(handle.read_line(&mut line)? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_socket_is_not_a_terminal() {
        let (a, _b) = UnixStream::pair().unwrap();
        assert!(RawModeGuard::enter(a.as_raw_fd()).unwrap().is_none());
    }
}
