//! Engine settings.

use std::path::Path;

use patchbay_core::RenderConfig;
use patchbay_core::undo::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::file;

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8000;
/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
/// Largest accepted block size in frames.
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Render and editing settings for one engine.
///
/// Every field has a default, so a partial `[engine]` table (or none at all)
/// is a valid document.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 256
/// max_events_per_block = 1024
/// history_limit = 100
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per processing chunk.
    pub block_size: usize,
    /// Capacity of every event buffer; events past it are dropped.
    pub max_events_per_block: usize,
    /// Undo depth.
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            max_events_per_block: 1024,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = file::read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        file::write_toml(path.as_ref(), self)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(ConfigError::invalid_setting(
                "sample_rate",
                format!(
                    "{} Hz is outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                    self.sample_rate
                ),
            ));
        }
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::invalid_setting(
                "block_size",
                format!("{} is outside 1..={MAX_BLOCK_SIZE}", self.block_size),
            ));
        }
        if self.max_events_per_block == 0 {
            return Err(ConfigError::invalid_setting(
                "max_events_per_block",
                "must be non-zero",
            ));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::invalid_setting(
                "history_limit",
                "must be non-zero",
            ));
        }
        Ok(())
    }

    /// The subset of settings the render engine needs.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            sample_rate: self.sample_rate as f32,
            block_size: self.block_size,
            max_events_per_block: self.max_events_per_block,
        }
    }
}
