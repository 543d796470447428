//! Error types for each component boundary
//!
//! Most of these never reach the operator: device and file level failures are
//! logged and replaced with a safe default by the component that hit them.
//! Only [`ResolveError::InsufficientCandidates`] and usage errors end a run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while probing a single joystick slot
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no device at {0:?}")]
    DeviceUnavailable(PathBuf),

    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("button count query failed on {path:?}: {source}")]
    CapabilityQuery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures of the identity resolution protocol
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("need at least 2 candidate devices, found {found}")]
    InsufficientCandidates { found: usize },
}

/// Failures reading the reference config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path:?} at byte {position}: {source}")]
    Parse {
        path: PathBuf,
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
}

/// Failures of the token swapper
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("invalid token pair: {0}")]
    InvalidTokens(String),

    #[error("no usable placeholder for {0:?}")]
    SentinelCollision(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to list {path:?}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures loading `settings.toml`
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not find config directory")]
    NoConfigDir,

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures driving the LED controller
#[derive(Debug, Error)]
pub enum LedError {
    #[error("invalid hex value {0:?}, use a format like 0x07 or 0x1F")]
    InvalidMask(String),

    #[error("value must be between 0x00 and 0xFF, got {0:#x}")]
    OutOfRange(u32),

    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}
