//! Error types for patch operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, validating or saving a patch.
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

    /// No parameter has this string id
    #[error("unknown parameter: {0}")]
    UnknownParam(String),

    /// Value lies outside the parameter's range
    #[error("parameter '{param}' = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Parameter id.
        param: String,
        /// Rejected value.
        value: f32,
        /// Range minimum.
        min: f32,
        /// Range maximum.
        max: f32,
    },

    /// Name did not match any choice of an enum-valued parameter
    #[error("unknown {param} '{value}'")]
    UnknownChoice {
        /// Parameter id.
        param: String,
        /// Rejected name.
        value: String,
    },

    /// Value has the wrong type for the parameter
    #[error("invalid value for '{param}': {reason}")]
    InvalidValue {
        /// Parameter id.
        param: String,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Unknown modulation source id
    #[error("unknown modulation source: {0}")]
    UnknownModSource(String),

    /// Unknown modulation destination id
    #[error("unknown modulation destination: {0}")]
    UnknownModDestination(String),

    /// Modulation slot index beyond the matrix
    #[error("modulation slot {index} out of range (max {max})")]
    SlotIndex {
        /// Requested slot.
        index: usize,
        /// Highest valid slot.
        max: usize,
    },

    /// Patch name not found among files or factory patches
    #[error("patch not found: {0}")]
    PatchNotFound(String),
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

    /// Create an invalid value error.
    pub fn invalid_value(param: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display_includes_path_and_source() {
        let err = ConfigError::read_file("/patches/pad.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("/patches/pad.toml"), "{msg}");
        assert!(msg.contains("mock"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn write_file_factory_produces_correct_variant() {
        let err = ConfigError::write_file("/out/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::WriteFile { ref path, .. } if path == std::path::Path::new("/out/path"))
        );
    }

    #[test]
    fn out_of_range_display() {
        let err = ConfigError::OutOfRange {
            param: "sustain".into(),
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "parameter 'sustain' = 1.5 is out of range [0, 1]"
        );
    }

    #[test]
    fn unknown_choice_display() {
        let err = ConfigError::UnknownChoice {
            param: "scale".into(),
            value: "lydian".into(),
        };
        assert_eq!(err.to_string(), "unknown scale 'lydian'");
    }

    #[test]
    fn toml_parse_converts() {
        let parse_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: ConfigError = parse_err.into();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
