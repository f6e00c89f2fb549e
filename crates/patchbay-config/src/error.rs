//! Error types for configuration operations.

use std::path::PathBuf;

use patchbay_core::GraphError;
use thiserror::Error;

/// Errors that can occur while loading, saving, or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// An engine setting is outside its accepted range.
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The session graph could not be loaded into a controller.
    #[error("failed to load session graph: {0}")]
    Graph(#[from] GraphError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid setting error.
    pub fn invalid_setting(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchbay_core::NodeId;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn write_file_display() {
        let err = ConfigError::write_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to write file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
    }

    #[test]
    fn create_dir_display() {
        let err = ConfigError::create_dir("/a/b", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to create directory"), "got: {msg}");
        assert!(msg.contains("/a/b"), "got: {msg}");
    }

    #[test]
    fn invalid_setting_display() {
        let err = ConfigError::invalid_setting("block_size", "must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid setting 'block_size': must be non-zero"
        );
    }

    #[test]
    fn graph_error_converts() {
        let err: ConfigError = GraphError::node_not_found(NodeId::from_raw(4)).into();
        assert_eq!(
            err.to_string(),
            "failed to load session graph: node NodeId(4) not found"
        );
    }

    #[test]
    fn io_variants_expose_source() {
        assert!(ConfigError::read_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::write_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::create_dir("/x", mock_io_err()).source().is_some());
    }

    #[test]
    fn toml_parse_converts() {
        let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(err.to_string().starts_with("failed to parse TOML"));
    }
}
