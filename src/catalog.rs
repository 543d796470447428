//! Joystick discovery
//!
//! Scans a bounded range of `/dev/input/jsN` slots, collects name and button
//! count for each present device and keeps the ones whose name matches.

use crate::error::CatalogError;
use crate::joystick;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A joystick found during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDevice {
    pub path: PathBuf,
    pub name: String,
    pub button_count: u8,
}

/// Where to look for joystick nodes and their sysfs metadata
#[derive(Debug, Clone)]
pub struct DeviceRoots {
    pub device_dir: PathBuf,
    pub sysfs_dir: PathBuf,
}

impl Default for DeviceRoots {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from("/dev/input"),
            sysfs_dir: PathBuf::from("/sys/class/input"),
        }
    }
}

/// Case-insensitive substring match on the device name
#[derive(Debug, Clone)]
pub struct NameFilter {
    needle: String,
}

impl NameFilter {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_lowercase(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.needle)
    }
}

/// Scan slots `0..max_slots` and return matching devices in slot order.
///
/// Missing slots are skipped. A device that cannot be opened or queried is
/// still listed, with a button count of 0. Returning fewer than two devices
/// is not an error here.
pub fn discover(roots: &DeviceRoots, max_slots: u32, filter: &NameFilter) -> Vec<CandidateDevice> {
    info!("Scanning joystick devices...");
    let mut devices = Vec::new();

    for index in 0..max_slots {
        let path = joystick::device_path(&roots.device_dir, index);
        let device = match probe_slot(roots, &path, index) {
            Ok(device) => device,
            Err(CatalogError::DeviceUnavailable(path)) => {
                info!("  {:?} (index {}): not present", path, index);
                continue;
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                CandidateDevice {
                    name: joystick::display_name(&roots.sysfs_dir, &slot_node(index)),
                    path,
                    button_count: 0,
                }
            }
        };

        info!(
            "  {:?} (index {}): '{}' - {} buttons",
            device.path, index, device.name, device.button_count
        );

        if filter.matches(&device.name) {
            devices.push(device);
        }
    }

    devices
}

fn slot_node(index: u32) -> String {
    format!("js{}", index)
}

fn probe_slot(roots: &DeviceRoots, path: &Path, index: u32) -> Result<CandidateDevice, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::DeviceUnavailable(path.to_path_buf()));
    }

    let file = joystick::open_nonblocking(path).map_err(|source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let button_count =
        joystick::button_count(&file).map_err(|source| CatalogError::CapabilityQuery {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(CandidateDevice {
        path: path.to_path_buf(),
        name: joystick::display_name(&roots.sysfs_dir, &slot_node(index)),
        button_count,
    })
}

/// Stable ordering by device path
pub fn sort_by_path(devices: &mut [CandidateDevice]) {
    devices.sort_by(|a, b| a.path.cmp(&b.path));
}
