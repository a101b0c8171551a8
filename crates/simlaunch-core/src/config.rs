//! Persistent configuration for simlaunch.
//!
//! Stores user settings in `~/.simlaunch/config.json`. The primary use case is
//! recording a default target device so that commands can omit `--device`.
//!
//! # Example
//!
//! ```no_run
//! use simlaunch_core::config::SimlaunchConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = SimlaunchConfig::load();
//!
//! if let Some(device) = &config.default_device {
//!     println!("Default device: {}", device);
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "config.json";

/// Device name simctl resolves to the currently booted simulator.
pub const BOOTED_DEVICE: &str = "booted";

/// Returns the simlaunch state directory (`~/.simlaunch`).
///
/// Falls back to the system temp directory when no home directory is known.
pub fn simlaunch_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".simlaunch")
}

/// Persistent simlaunch configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SimlaunchConfig {
    /// UDID used when no device is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_device: Option<String>,
}

impl SimlaunchConfig {
    /// Load config from `~/.simlaunch/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&simlaunch_dir().join(CONFIG_FILENAME))
    }

    /// Load config from an explicit file path, with the same fallback as [`Self::load`].
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.simlaunch/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&simlaunch_dir().join(CONFIG_FILENAME))
    }

    /// Save config to an explicit file path, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Sets or clears the default device. A blank UDID clears it.
    pub fn set_default_device(&mut self, udid: Option<&str>) {
        self.default_device = udid
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);
    }

    /// Picks the target device: an explicit choice, then the configured
    /// default, then whichever simulator is booted. Blank values are skipped.
    pub fn resolve_device(&self, explicit: Option<&str>) -> String {
        explicit
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.default_device
                    .clone()
                    .filter(|d| !d.trim().is_empty())
            })
            .unwrap_or_else(|| BOOTED_DEVICE.to_string())
    }
}
