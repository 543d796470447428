//! Player 1 identification
//!
//! Watches every candidate joystick for a press of the confirm button. The
//! device that reports it first is Player 1. If nobody presses anything before
//! the timeout, the button counts of the first two candidates are compared
//! against the known wiring instead.
//!
//! Flow: scanning -> awaiting event -> resolved by event, or awaiting fallback
//! -> resolved by fallback.

use crate::catalog::CandidateDevice;
use crate::error::ResolveError;
use crate::joystick;
use crate::poll::{self, Readiness};
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Hardware facts the resolver compares against
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long to wait for the confirm press
    pub timeout: Duration,
    /// Button number treated as "confirm" (1 = A on the Xin-Mo boards)
    pub confirm_button: u8,
    /// Buttons wired on the Player 1 board
    pub expected_primary_buttons: u8,
    /// Buttons wired on the Player 2 board
    pub expected_secondary_buttons: u8,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            confirm_button: 1,
            expected_primary_buttons: 15,
            expected_secondary_buttons: 13,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    ObservedPress,
    FallbackHeuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Ok,
    Swapped,
    Inconclusive,
}

/// Outcome of identity resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionVerdict {
    pub method: ResolutionMethod,
    /// `None` when the fallback could not decide
    pub swapped: Option<bool>,
    /// Device the confirm press came from
    pub primary: Option<CandidateDevice>,
    pub confidence: Confidence,
}

impl ResolutionVerdict {
    /// Process exit code for the identity check: 0 ok, 1 swapped, 2 inconclusive
    pub fn exit_code(&self) -> u8 {
        match self.confidence {
            Confidence::Ok => 0,
            Confidence::Swapped => 1,
            Confidence::Inconclusive => 2,
        }
    }
}

/// An open event stream tagged with the candidate it belongs to
pub struct WatchedStream<S> {
    stream: S,
    device: usize,
    silent: bool,
}

impl<S> WatchedStream<S> {
    pub fn new(stream: S, device: usize) -> Self {
        Self {
            stream,
            device,
            silent: false,
        }
    }
}

/// Resolves which candidate is Player 1
pub struct IdentityResolver {
    config: ResolverConfig,
}

impl IdentityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Run the full protocol over `candidates` (sorted by path).
    ///
    /// Fails before touching any device if fewer than two candidates are given.
    /// Every stream opened here is dropped before returning.
    pub fn resolve(&self, candidates: &[CandidateDevice]) -> Result<ResolutionVerdict, ResolveError> {
        if candidates.len() < 2 {
            return Err(ResolveError::InsufficientCandidates {
                found: candidates.len(),
            });
        }

        let mut streams: Vec<WatchedStream<File>> = Vec::with_capacity(candidates.len());
        for (index, device) in candidates.iter().enumerate() {
            match joystick::open_nonblocking(&device.path) {
                Ok(file) => streams.push(WatchedStream::new(file, index)),
                Err(e) => warn!("Failed to open {:?} for events: {}", device.path, e),
            }
        }

        info!(
            "Waiting {}s for button {} on Player 1...",
            self.config.timeout.as_secs(),
            self.config.confirm_button
        );

        let pressed = self.await_press(&mut streams);
        drop(streams);

        match pressed.and_then(|index| candidates.get(index)) {
            Some(device) => {
                info!(
                    "Detected button {} press on {} ({:?})",
                    self.config.confirm_button, device.name, device.path
                );
                Ok(self.press_verdict(device))
            }
            None => {
                info!("Timeout reached, no button press detected");
                Ok(self.fallback_verdict(candidates))
            }
        }
    }

    /// Multiplex reads over `streams` until a confirm press arrives or the
    /// timeout elapses. Returns the candidate index of the pressing device.
    ///
    /// A stream that errors or hangs up is ignored for the rest of the wait.
    pub fn await_press<S: Read + AsRawFd>(&self, streams: &mut [WatchedStream<S>]) -> Option<usize> {
        let deadline = Instant::now() + self.config.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            let active: Vec<usize> = (0..streams.len()).filter(|&i| !streams[i].silent).collect();
            if active.is_empty() {
                warn!("No readable joystick streams left");
                return None;
            }
            let fds: Vec<RawFd> = active.iter().map(|&i| streams[i].stream.as_raw_fd()).collect();

            let ready = match poll::wait_readable(&fds, remaining) {
                Ok(ready) => ready,
                Err(e) => {
                    warn!("Waiting on joystick streams failed: {}", e);
                    return None;
                }
            };

            for (slot, readiness) in ready {
                let watched = &mut streams[active[slot]];
                if readiness == Readiness::Closed {
                    warn!("Joystick stream {} closed, ignoring it", watched.device);
                    watched.silent = true;
                    continue;
                }

                match joystick::read_event(&mut watched.stream) {
                    Ok(Some(event)) => {
                        debug!("Event from device {}: {:?}", watched.device, event);
                        if event.is_press_of(self.config.confirm_button) {
                            return Some(watched.device);
                        }
                    }
                    Ok(None) => {}
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => {
                        warn!("Read error on joystick stream {}: {}", watched.device, e);
                        watched.silent = true;
                    }
                }
            }
        }
    }

    /// Verdict when the confirm press came from `device`
    pub fn press_verdict(&self, device: &CandidateDevice) -> ResolutionVerdict {
        let swapped = device.button_count != self.config.expected_primary_buttons;
        if swapped {
            warn!(
                "Device identified as Player 1 has {} buttons (expected {}), controls look reversed",
                device.button_count, self.config.expected_primary_buttons
            );
        }

        ResolutionVerdict {
            method: ResolutionMethod::ObservedPress,
            swapped: Some(swapped),
            primary: Some(device.clone()),
            confidence: if swapped {
                Confidence::Swapped
            } else {
                Confidence::Ok
            },
        }
    }

    /// Verdict from the button counts of the first two candidates
    pub fn fallback_verdict(&self, candidates: &[CandidateDevice]) -> ResolutionVerdict {
        info!("Falling back to button count analysis...");

        let expected = (
            self.config.expected_primary_buttons,
            self.config.expected_secondary_buttons,
        );
        let counts = match candidates {
            [first, second, ..] => Some((first.button_count, second.button_count)),
            _ => None,
        };

        let (swapped, confidence) = match counts {
            Some(pair) if pair == expected => {
                info!("Button counts suggest correct mapping ({} then {})", pair.0, pair.1);
                (Some(false), Confidence::Ok)
            }
            Some(pair) if pair == (expected.1, expected.0) => {
                warn!("Button counts suggest Player 1 and Player 2 are swapped");
                (Some(true), Confidence::Swapped)
            }
            _ => {
                warn!("Button counts are unusual and inconclusive: {:?}", counts);
                (None, Confidence::Inconclusive)
            }
        };

        ResolutionVerdict {
            method: ResolutionMethod::FallbackHeuristic,
            swapped,
            primary: None,
            confidence,
        }
    }
}
