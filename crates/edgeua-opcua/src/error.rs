// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA protocol error types.
//!
//! The errors in this module describe failures without knowing which device
//! or command triggered them. The session layer attaches that context with
//! [`OpcUaError::into_driver_error`] before anything reaches the host.
//!
//! # Error Categories
//!
//! ```text
//! OpcUaError
//! ├── NodeId        - malformed node identifier strings
//! ├── Configuration - invalid protocol properties
//! ├── Conversion    - value coercion failures
//! └── Transport     - discovery, connection and service failures
//! ```

use edgeua_core::error::{DriverError, Operation};
use edgeua_core::types::ValueType;
use thiserror::Error;

/// Result type for OPC UA operations.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// OpcUaError - Main Error Type
// =============================================================================

/// Umbrella error for the OPC UA layer.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// Node identifier parse failure.
    #[error(transparent)]
    NodeId(#[from] NodeIdError),

    /// Protocol property failure.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Value conversion failure for a named resource.
    #[error("resource '{resource}': {source}")]
    Conversion {
        /// Resource being converted.
        resource: String,
        /// Underlying failure.
        #[source]
        source: ConversionError,
    },

    /// Transport failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl OpcUaError {
    /// Creates a conversion error bound to a resource.
    pub fn conversion(resource: impl Into<String>, source: ConversionError) -> Self {
        Self::Conversion {
            resource: resource.into(),
            source,
        }
    }

    /// Attaches device and operation context.
    pub fn into_driver_error(self, device: &str, operation: Operation) -> DriverError {
        match self {
            Self::NodeId(e) => e.into_driver_error(device, operation),
            Self::Configuration(e) => e.into_driver_error(device, operation),
            Self::Conversion { resource, source } => source.into_driver_error(device, operation, &resource),
            Self::Transport(e) => e.into_driver_error(device, operation),
        }
    }
}

// =============================================================================
// NodeIdError
// =============================================================================

/// Failure to parse a node identifier string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeIdError {
    /// The string was empty.
    #[error("node id is empty")]
    Empty,

    /// The `ns=` prefix did not hold a valid namespace index.
    #[error("invalid namespace index in '{input}'")]
    InvalidNamespace {
        /// The offending input.
        input: String,
    },

    /// The identifier part was malformed.
    #[error("invalid identifier in '{input}': {reason}")]
    InvalidIdentifier {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The identifier type prefix was not one of `i=`, `s=`, `g=`, `b=`.
    #[error("unknown identifier type in '{input}', expected i=, s=, g= or b=")]
    UnknownType {
        /// The offending input.
        input: String,
    },
}

impl NodeIdError {
    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::InvalidNamespace { input }
            | Self::InvalidIdentifier { input, .. }
            | Self::UnknownType { input } => input,
        }
    }

    /// Attaches device and operation context.
    pub fn into_driver_error(self, device: &str, operation: Operation) -> DriverError {
        let input = self.input().to_string();
        DriverError::parse(device, operation, input, self.to_string())
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid or missing protocol properties.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The device has no properties for the protocol.
    #[error("no '{protocol}' protocol properties")]
    MissingProtocol {
        /// Protocol key.
        protocol: String,
    },

    /// A required field is absent or empty.
    #[error("{field} is required")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A field has the wrong shape.
    #[error("{field}: {message}")]
    InvalidField {
        /// Field name.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// Unknown security policy name.
    #[error("Policy must be one of None, Basic128Rsa15, Basic256, Basic256Sha256 (got '{value}')")]
    InvalidPolicy {
        /// The rejected value.
        value: String,
    },

    /// Unknown security mode name.
    #[error("Mode must be one of None, Sign, SignAndEncrypt (got '{value}')")]
    InvalidMode {
        /// The rejected value.
        value: String,
    },

    /// Certificate material is required for a secured endpoint.
    #[error("{field} is required unless Policy and Mode are both None")]
    MissingCredential {
        /// `CertFile` or `KeyFile`.
        field: String,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attaches device and operation context.
    pub fn into_driver_error(self, device: &str, operation: Operation) -> DriverError {
        DriverError::config(device, operation, self.to_string())
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Failure to coerce between host values and OPC UA values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value does not match the declared type.
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared type.
        expected: ValueType,
        /// Name of the actual value kind.
        actual: String,
    },

    /// The value does not fit the declared type.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Rendered value.
        value: String,
        /// Declared type.
        target: ValueType,
    },

    /// No codec exists for the declared type.
    #[error("unsupported value type {value_type}")]
    Unsupported {
        /// Declared type.
        value_type: ValueType,
    },
}

impl ConversionError {
    /// Creates a type mismatch error.
    pub fn mismatch(expected: ValueType, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            actual: actual.into(),
        }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(value: impl ToString, target: ValueType) -> Self {
        Self::OutOfRange {
            value: value.to_string(),
            target,
        }
    }

    /// Attaches device, operation and resource context.
    pub fn into_driver_error(self, device: &str, operation: Operation, resource: &str) -> DriverError {
        DriverError::value_conversion(device, operation, resource, self.to_string())
    }
}

// =============================================================================
// TransportError
// =============================================================================

/// Failures reported by the wire transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint discovery failed.
    #[error("endpoint discovery failed for {url}: {message}")]
    Discovery {
        /// Discovery URL.
        url: String,
        /// Failure detail.
        message: String,
    },

    /// No endpoint offers the configured policy and mode.
    #[error("failed to find suitable endpoint (policy={policy}, mode={mode})")]
    NoMatchingEndpoint {
        /// Configured policy.
        policy: String,
        /// Configured mode.
        mode: String,
    },

    /// Session establishment failed.
    #[error("failed to open session to {url}: {message}")]
    Open {
        /// Endpoint URL.
        url: String,
        /// Failure detail.
        message: String,
    },

    /// The connection is closed.
    #[error("connection is closed")]
    Closed,

    /// A service call failed before a status was returned.
    #[error("{service} request failed: {message}")]
    Request {
        /// Service name (`read`, `write`, `call`, ...).
        service: &'static str,
        /// Failure detail.
        message: String,
    },

    /// The server returned a non-good status.
    #[error("{service} status not OK: 0x{status:08X}")]
    BadStatus {
        /// Service name.
        service: &'static str,
        /// OPC UA status code.
        status: u32,
    },

    /// No transport implementation is compiled in.
    #[error("transport unavailable: {message}")]
    Unavailable {
        /// Failure detail.
        message: String,
    },
}

impl TransportError {
    /// Creates a request failure.
    pub fn request(service: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            service,
            message: message.into(),
        }
    }

    /// Creates a bad status error.
    pub fn bad_status(service: &'static str, status: u32) -> Self {
        Self::BadStatus { service, status }
    }

    /// Returns `true` if the remote answered with a status.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::BadStatus { .. })
    }

    /// Attaches device and operation context.
    ///
    /// Status failures become protocol errors; everything else is a
    /// connection error keeping the transport failure as its source.
    pub fn into_driver_error(self, device: &str, operation: Operation) -> DriverError {
        if self.is_status() {
            DriverError::protocol(device, operation, self.to_string())
        } else {
            let message = self.to_string();
            DriverError::connection_with(device, operation, message, self)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_error_maps_to_parse() {
        let err = NodeIdError::InvalidNamespace { input: "ns=x;s=a".into() };
        let driver = err.into_driver_error("boiler", Operation::Read);
        assert_eq!(driver.error_type(), "parse");
        assert!(driver.to_string().contains("ns=x;s=a"));
    }

    #[test]
    fn test_bad_status_maps_to_protocol() {
        let err = TransportError::bad_status("call", 0x8034_0000);
        let driver = err.into_driver_error("boiler", Operation::Call);
        assert_eq!(driver.error_type(), "protocol");
        assert!(driver.to_string().contains("0x80340000"));
    }

    #[test]
    fn test_request_failure_maps_to_connection() {
        let err = TransportError::request("read", "socket reset");
        let driver = err.into_driver_error("boiler", Operation::Read);
        assert_eq!(driver.error_type(), "connection");
        assert!(driver.is_retryable());
    }

    #[test]
    fn test_conversion_keeps_resource() {
        let err = OpcUaError::conversion(
            "Level",
            ConversionError::mismatch(ValueType::Int32, "string"),
        );
        let driver = err.into_driver_error("tank", Operation::Write);
        let msg = driver.to_string();
        assert!(msg.contains("Level"));
        assert!(msg.contains("expected Int32, got string"));
    }

    #[test]
    fn test_configuration_messages() {
        let err = ConfigurationError::MissingCredential { field: "CertFile".into() };
        assert_eq!(err.to_string(), "CertFile is required unless Policy and Mode are both None");
        let driver = err.into_driver_error("tank", Operation::Connect);
        assert_eq!(driver.status_code(), 400);
    }
}
