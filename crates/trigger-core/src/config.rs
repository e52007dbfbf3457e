//! Configuration loading for the trigger system.
//!
//! Settings are loaded from a TOML file; every table is optional and falls
//! back to its defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trigger_events::Aabb;

/// Complete trigger system configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Spatial grid resolution
    #[serde(default)]
    pub grid: GridConfig,
    /// World rectangle covered by the grid. Defaults to the union of all zones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_bounds: Option<Aabb>,
}

impl TriggerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builder-style override of the world bounds.
    pub fn with_world_bounds(mut self, bounds: Aabb) -> Self {
        self.world_bounds = Some(bounds);
        self
    }

    /// Builder-style override of the grid resolution.
    pub fn with_grid(mut self, columns: usize, rows: usize) -> Self {
        self.grid = GridConfig { columns, rows };
        self
    }
}

/// Grid resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 16,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Trigger System Configuration

[grid]
columns = 16
rows = 16

# Uncomment to pin the grid to a fixed world rectangle instead of the
# union of all zones.
# [world_bounds]
# min = { x = -100.0, y = -100.0 }
# max = { x = 100.0, y = 100.0 }
"#
    .to_string()
}
