//! TOML file helpers shared by the config documents.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;

pub(crate) fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    Ok(toml::from_str(&content)?)
}

pub(crate) fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }

    let content = toml::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}
