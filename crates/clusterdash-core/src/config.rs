//! Runtime configuration
//!
//! Stored as JSON. Every field is optional in the file; anything missing
//! takes the built-in default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::brightness::DEFAULT_BACKLIGHT_PATHS;
use crate::protocol::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS};
use crate::store::SaveThresholds;

/// Render loop rate
pub const DEFAULT_LOOP_HZ: u32 = 60;

/// Default location of the persistent record, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "persistent_data.json";

/// Errors that can occur while loading or saving the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to read config: {0}")]
    IoError(#[from] io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Invalid config: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port name; probed for when absent
    pub port: Option<String>,

    /// Baud rate
    pub baud_rate: u32,

    /// Transport read timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Connection settings
    pub connection: ConnectionSettings,

    /// Persistent record file
    pub data_path: PathBuf,

    /// Backlight control files, tried in order
    pub backlight_paths: Vec<PathBuf>,

    /// Render loop rate in Hz
    pub loop_hz: u32,

    /// Change needed before the persistent record is rewritten
    pub save_thresholds: SaveThresholds,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings::default(),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            backlight_paths: DEFAULT_BACKLIGHT_PATHS.iter().map(PathBuf::from).collect(),
            loop_hz: DEFAULT_LOOP_HZ,
            save_thresholds: SaveThresholds::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path`, or defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: DashboardConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loop period in milliseconds
    pub fn tick_interval_ms(&self) -> u64 {
        1000 / u64::from(self.loop_hz.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = DashboardConfig::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.tick_interval_ms(), 16);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"connection": {"port": "/dev/ttyACM0"}, "loop_hz": 30}"#,
        )
        .unwrap();

        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.connection.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.connection.timeout_ms, 100);
        assert_eq!(config.loop_hz, 30);
        assert_eq!(config.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "loop_hz = 60").unwrap();
        assert!(matches!(
            DashboardConfig::load(&path),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = DashboardConfig::default();
        config.save_thresholds.fuel = 0.05;
        config.save(&path).unwrap();
        assert_eq!(DashboardConfig::load(&path).unwrap(), config);
    }
}
