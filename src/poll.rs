//! Readiness wait over a set of raw descriptors
//!
//! Thin wrapper around `poll(2)`. A single blocking call covers every watched
//! device, whichever becomes readable first is reported first.

use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// State of one descriptor after a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Data can be read without blocking
    Readable,
    /// Error or hangup, the descriptor will not produce events anymore
    Closed,
}

/// Block until at least one of `fds` is ready or `timeout` elapses.
///
/// Returns `(index into fds, readiness)` for every ready descriptor, in
/// index order. An empty result means the timeout elapsed or the wait was
/// interrupted by a signal; callers re-check their deadline and wait again.
pub fn wait_readable(fds: &[RawFd], timeout: Duration) -> io::Result<Vec<(usize, Readiness)>> {
    let mut pollfds: Vec<libc::pollfd> = fds
        .iter()
        .map(|&fd| libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

    let rc = unsafe {
        libc::poll(
            pollfds.as_mut_ptr(),
            pollfds.len() as libc::nfds_t,
            timeout_ms,
        )
    };

    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Vec::new());
        }
        return Err(err);
    }

    let ready = pollfds
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            if p.revents & libc::POLLIN != 0 {
                Some((i, Readiness::Readable))
            } else if p.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                Some((i, Readiness::Closed))
            } else {
                None
            }
        })
        .collect();

    Ok(ready)
}
