// Copyright 2026 Serial Tag Reader Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration module.
//!
//! Handles loading and saving application settings.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluetooth::{ACK_TOKEN, COMMAND_TERMINATOR, LINE_DELIMITER, READ_COMMAND};

const APP_DIR: &str = "serial-tag-reader";

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bluetooth settings.
    pub bluetooth: BluetoothConfig,

    /// Tag reader protocol settings.
    pub reader: ReaderConfig,

    /// Terminal display settings.
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Adapter name (e.g. "hci0"). The default adapter is used when unset.
    pub adapter: Option<String>,

    /// RFCOMM channel of the serial port service.
    pub rfcomm_channel: u8,

    /// Only list paired devices that advertise the serial port profile.
    pub spp_only: bool,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            adapter: None,
            rfcomm_channel: 1,
            spp_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Command that triggers a tag scan.
    pub read_command: String,

    /// Acknowledgement token the reader sends back.
    pub ack_token: String,

    /// Seconds to wait for a tag before standing by again.
    pub read_timeout_secs: u64,

    /// Terminator appended to outbound commands.
    pub command_terminator: String,

    /// Delimiter that ends an inbound line.
    pub line_delimiter: char,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_command: READ_COMMAND.to_string(),
            ack_token: ACK_TOKEN.to_string(),
            read_timeout_secs: 11,
            command_terminator: COMMAND_TERMINATOR.to_string(),
            line_delimiter: LINE_DELIMITER as char,
        }
    }
}

impl ReaderConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Delimiter as a single byte. Non-ASCII delimiters fall back to LF.
    pub fn delimiter_byte(&self) -> u8 {
        if self.line_delimiter.is_ascii() {
            self.line_delimiter as u8
        } else {
            LINE_DELIMITER
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Seconds before the status line clears itself.
    pub status_clear_secs: u64,

    /// Prefix log lines with the local time.
    pub timestamps: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            status_clear_secs: 5,
            timestamps: true,
        }
    }
}

impl DisplayConfig {
    pub fn status_clear_after(&self) -> Duration {
        Duration::from_secs(self.status_clear_secs)
    }
}

impl Config {
    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path, writing defaults if missing.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reader_protocol() {
        let config = Config::default();
        assert_eq!(config.reader.read_command, "read");
        assert_eq!(config.reader.ack_token, "OK");
        assert_eq!(config.reader.command_terminator, "\r\n");
        assert_eq!(config.reader.delimiter_byte(), b'\n');
        assert_eq!(config.reader.read_timeout(), Duration::from_secs(11));
        assert_eq!(config.display.status_clear_after(), Duration::from_secs(5));
        assert_eq!(config.bluetooth.rfcomm_channel, 1);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.reader.read_timeout_secs, 11);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[reader]\nread_timeout_secs = 3\n\n[bluetooth]\nadapter = \"hci1\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.reader.read_timeout_secs, 3);
        assert_eq!(config.reader.ack_token, "OK");
        assert_eq!(config.bluetooth.adapter.as_deref(), Some("hci1"));
        assert!(config.display.timestamps);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.bluetooth.spp_only = true;
        config.display.status_clear_secs = 2;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.bluetooth.spp_only);
        assert_eq!(loaded.display.status_clear_secs, 2);
    }
}
