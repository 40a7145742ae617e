// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types for edgeua-config.
//!
//! Loading errors (file access, syntax) and validation errors (names,
//! references, value types) share one enum so callers can report them the
//! same way.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// File I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Two devices share a name.
    #[error("Duplicate device name: {name}")]
    DuplicateDevice {
        /// The duplicated name.
        name: String,
    },

    /// Two profiles share a name.
    #[error("Duplicate profile name: {name}")]
    DuplicateProfile {
        /// The duplicated name.
        name: String,
    },

    /// A device references a profile that is not defined.
    #[error("Device '{device}' references unknown profile '{profile}'")]
    UnknownProfile {
        /// The device name.
        device: String,
        /// The missing profile name.
        profile: String,
    },

    /// Invalid environment variable value.
    #[error("Invalid environment variable value for '{name}': {message}")]
    InvalidEnvVar {
        /// The environment variable name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Unsupported configuration format.
    #[error("Unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The unsupported format.
        format: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a duplicate device error.
    pub fn duplicate_device(name: impl Into<String>) -> Self {
        Self::DuplicateDevice { name: name.into() }
    }

    /// Creates a duplicate profile error.
    pub fn duplicate_profile(name: impl Into<String>) -> Self {
        Self::DuplicateProfile { name: name.into() }
    }

    /// Creates an unknown profile error.
    pub fn unknown_profile(device: impl Into<String>, profile: impl Into<String>) -> Self {
        Self::UnknownProfile {
            device: device.into(),
            profile: profile.into(),
        }
    }

    /// Creates an invalid environment variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns `true` if the error comes from the file system rather than the
    /// file contents.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::FileNotFound { .. })
    }

    /// Returns `true` if the file parsed but failed validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::DuplicateDevice { .. }
                | Self::DuplicateProfile { .. }
                | Self::UnknownProfile { .. }
        )
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::unknown_profile("boiler-1", "thermo");
        assert_eq!(
            err.to_string(),
            "Device 'boiler-1' references unknown profile 'thermo'"
        );

        let err = ConfigError::validation("api.port", "must not be 0");
        assert_eq!(err.to_string(), "Validation failed for 'api.port': must not be 0");
    }

    #[test]
    fn test_error_classification() {
        assert!(ConfigError::file_not_found("/tmp/x.yaml").is_io());
        assert!(ConfigError::duplicate_device("a").is_validation());
        assert!(!ConfigError::serialization("bad").is_validation());
    }
}
