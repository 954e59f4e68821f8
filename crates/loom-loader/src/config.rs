// Copyright 2025 eraflo
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


//! Loader tuning, loadable from JSON.

use loom_core::PathRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// An error raised while reading or writing a [`LoaderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("config file '{}': {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The JSON did not describe a valid config.
    #[error("invalid loader config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Timer cadences, the stall valve threshold, and the path translation rules.
///
/// Every field has a default, so a JSON document only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Delay between resolver ticks while definitions are pending.
    pub tick_interval_ms: u64,
    /// How long resolution may go without progress before a stall is reported.
    pub watchdog_window_ms: u64,
    /// How often the watchdog compares its deadline against the clock.
    pub watchdog_check_interval_ms: u64,
    /// Consecutive paused pump ticks after which the sequential queue force-resumes.
    pub max_paused_pump_ticks: u32,
    /// The reserved package segment dropped during path translation.
    pub engine_segment: String,
    /// The extension appended to translated file paths.
    pub source_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            watchdog_window_ms: 10_000,
            watchdog_check_interval_ms: 1_000,
            max_paused_pump_ticks: 100,
            engine_segment: "engine".to_string(),
            source_extension: ".js".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The resolver tick interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// The watchdog window.
    pub fn watchdog_window(&self) -> Duration {
        Duration::from_millis(self.watchdog_window_ms)
    }

    /// The watchdog check interval.
    pub fn watchdog_check_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_check_interval_ms)
    }

    /// The path translation rules described by this config.
    pub fn path_rules(&self) -> PathRules {
        PathRules::new(self.engine_segment.clone(), self.source_extension.clone())
    }
}
