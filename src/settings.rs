//! Application settings management
//!
//! Hardware facts (button counts, joystick codes, the anchor port) live in
//! `~/.config/joyswap/settings.toml` so another cabinet can be described
//! without rebuilding. Every field has a default matching the Xin-Mo dual
//! arcade encoder setup.

use crate::catalog::{DeviceRoots, NameFilter};
use crate::error::{SettingsError, SwapError};
use crate::resolver::ResolverConfig;
use crate::swapper::TokenPair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub devices: DeviceSettings,
    pub resolver: ResolverSettings,
    pub mapping: MappingSettings,
    pub leds: LedSettings,
    pub prompt: PromptSettings,
}

/// Joystick discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Number of `jsN` slots to scan
    pub max_slots: u32,
    /// Case-insensitive substring the device name must contain
    pub name_filter: String,
    pub device_dir: PathBuf,
    pub sysfs_dir: PathBuf,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        let roots = DeviceRoots::default();
        Self {
            max_slots: 5,
            name_filter: "xin".to_string(),
            device_dir: roots.device_dir,
            sysfs_dir: roots.sysfs_dir,
        }
    }
}

/// Player 1 identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub timeout_secs: u64,
    pub confirm_button: u8,
    pub expected_primary_buttons: u8,
    pub expected_secondary_buttons: u8,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        let defaults = ResolverConfig::default();
        Self {
            timeout_secs: defaults.timeout.as_secs(),
            confirm_button: defaults.confirm_button,
            expected_primary_buttons: defaults.expected_primary_buttons,
            expected_secondary_buttons: defaults.expected_secondary_buttons,
        }
    }
}

/// MAME config mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSettings {
    /// Joystick code of the Player 1 board
    pub first_token: String,
    /// Joystick code of the Player 2 board, expected on the anchor port
    pub second_token: String,
    pub anchor_port: String,
    /// File inside the config directory that is inspected
    pub reference_file: String,
    /// Extension of the files that get rewritten
    pub file_suffix: String,
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self {
            first_token: "JOYCODE_2_".to_string(),
            second_token: "JOYCODE_3_".to_string(),
            anchor_port: "P2_BUTTON1".to_string(),
            reference_file: "default.cfg".to_string(),
            file_suffix: "cfg".to_string(),
        }
    }
}

/// LED controller (PacDrive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedSettings {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for LedSettings {
    fn default() -> Self {
        Self {
            vendor_id: 0xD209,
            product_id: 0x1500,
        }
    }
}

/// Operator acknowledgement before rewriting configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Seconds to wait for a key press, 0 disables the wait
    pub acknowledge_secs: u64,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self { acknowledge_secs: 30 }
    }
}

impl AppSettings {
    /// Default settings file path
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(config_dir.join("joyswap").join("settings.toml"))
    }

    /// Load settings from `path` (or the default path), defaults if absent
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let settings = Self::from_toml(&content).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn device_roots(&self) -> DeviceRoots {
        DeviceRoots {
            device_dir: self.devices.device_dir.clone(),
            sysfs_dir: self.devices.sysfs_dir.clone(),
        }
    }

    pub fn name_filter(&self) -> NameFilter {
        NameFilter::new(&self.devices.name_filter)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            timeout: Duration::from_secs(self.resolver.timeout_secs),
            confirm_button: self.resolver.confirm_button,
            expected_primary_buttons: self.resolver.expected_primary_buttons,
            expected_secondary_buttons: self.resolver.expected_secondary_buttons,
        }
    }

    pub fn token_pair(&self) -> Result<TokenPair, SwapError> {
        TokenPair::new(&self.mapping.first_token, &self.mapping.second_token)
    }
}
