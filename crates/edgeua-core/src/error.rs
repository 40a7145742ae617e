// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Driver error taxonomy.
//!
//! Every error raised while serving a device carries the device name and the
//! operation that failed, so a single `Display` line is enough for an operator
//! to tell what went wrong and where.
//!
//! # Error Kinds
//!
//! ```text
//! DriverError
//! ├── Config           - malformed or missing protocol properties
//! ├── DeviceState      - device is locked or down
//! ├── Connection       - endpoint selection or transport failure
//! ├── NotFound         - unknown device, resource, attribute or method
//! ├── Parse            - malformed node identifier
//! ├── Protocol         - non-OK status from the remote or an unusable reply
//! ├── NotAllowed       - the resource forbids the command (hidden method)
//! ├── ValueConversion  - declared type mismatch or unsupported type
//! ├── Timeout          - a network round-trip exceeded the request timeout
//! └── NotSupported     - the driver does not implement the operation
//! ```
//!
//! # Examples
//!
//! ```
//! use edgeua_core::error::{DriverError, Operation};
//!
//! let err = DriverError::protocol("boiler-1", Operation::Read, "status not OK: 0x80340000");
//! assert_eq!(err.device(), Some("boiler-1"));
//! assert_eq!(err.status_code(), 502);
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AdminState, OperatingState};

/// Result alias used across the driver.
pub type DriverResult<T> = Result<T, DriverError>;

/// Boxed error used as the cause of a wrapped failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Operation
// =============================================================================

/// The driver operation during which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Opening a session to the device.
    Connect,
    /// Serving a read command batch.
    Read,
    /// Serving a write command batch.
    Write,
    /// Invoking a remote method.
    Call,
    /// Running the change-notification listener.
    Subscribe,
    /// Validating protocol properties.
    Validate,
    /// Discovering devices.
    Discover,
    /// Adding, updating or removing a device.
    Manage,
}

impl Operation {
    /// Returns the operation name used in messages and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Read => "read",
            Self::Write => "write",
            Self::Call => "call",
            Self::Subscribe => "subscribe",
            Self::Validate => "validate",
            Self::Discover => "discover",
            Self::Manage => "manage",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// DriverError
// =============================================================================

/// Errors returned by driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Protocol properties are missing or invalid.
    #[error("[{device}] {operation}: invalid configuration: {message}")]
    Config {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// What is wrong with the configuration.
        message: String,
    },

    /// The device is administratively locked or operationally down.
    #[error("[{device}] {operation}: device is locked or down (admin={admin_state}, operating={operating_state})")]
    DeviceState {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Administrative state at the time of the check.
        admin_state: AdminState,
        /// Operating state at the time of the check.
        operating_state: OperatingState,
    },

    /// No suitable endpoint, or the transport could not be opened.
    #[error("[{device}] {operation}: connection failed: {message}")]
    Connection {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Failure description.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<BoxError>,
    },

    /// Unknown device, resource, attribute or method.
    #[error("[{device}] {operation}: {what} not found")]
    NotFound {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Description of the missing entity.
        what: String,
    },

    /// Malformed node identifier.
    #[error("[{device}] {operation}: invalid node id '{input}': {reason}")]
    Parse {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// The offending input.
        input: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// The remote returned a non-OK status or an unusable reply.
    #[error("[{device}] {operation}: {message}")]
    Protocol {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Failure description.
        message: String,
    },

    /// The resource exists but refuses the command.
    #[error("[{device}] {operation}: {what} not allowed")]
    NotAllowed {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Description of the refused command.
        what: String,
    },

    /// A value does not match its declared type.
    #[error("[{device}] {operation}: cannot convert value of '{resource}': {message}")]
    ValueConversion {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// Resource whose value failed conversion.
        resource: String,
        /// Failure description.
        message: String,
    },

    /// A network round-trip exceeded the configured request timeout.
    #[error("[{device}] {operation}: timed out after {timeout:?}")]
    Timeout {
        /// Device name.
        device: String,
        /// Failed operation.
        operation: Operation,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The operation is not implemented by this driver.
    #[error("{operation} is not supported by this driver")]
    NotSupported {
        /// Unsupported operation.
        operation: Operation,
    },
}

impl DriverError {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a configuration error.
    pub fn config(device: impl Into<String>, operation: Operation, message: impl Into<String>) -> Self {
        Self::Config {
            device: device.into(),
            operation,
            message: message.into(),
        }
    }

    /// Creates a device state error.
    pub fn device_state(
        device: impl Into<String>,
        operation: Operation,
        admin_state: AdminState,
        operating_state: OperatingState,
    ) -> Self {
        Self::DeviceState {
            device: device.into(),
            operation,
            admin_state,
            operating_state,
        }
    }

    /// Creates a connection error without a cause.
    pub fn connection(device: impl Into<String>, operation: Operation, message: impl Into<String>) -> Self {
        Self::Connection {
            device: device.into(),
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection error wrapping an underlying cause.
    pub fn connection_with<E>(
        device: impl Into<String>,
        operation: Operation,
        message: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            device: device.into(),
            operation,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(device: impl Into<String>, operation: Operation, what: impl Into<String>) -> Self {
        Self::NotFound {
            device: device.into(),
            operation,
            what: what.into(),
        }
    }

    /// Creates a node identifier parse error.
    pub fn parse(
        device: impl Into<String>,
        operation: Operation,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Parse {
            device: device.into(),
            operation,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(device: impl Into<String>, operation: Operation, message: impl Into<String>) -> Self {
        Self::Protocol {
            device: device.into(),
            operation,
            message: message.into(),
        }
    }

    /// Creates a not-allowed error.
    pub fn not_allowed(device: impl Into<String>, operation: Operation, what: impl Into<String>) -> Self {
        Self::NotAllowed {
            device: device.into(),
            operation,
            what: what.into(),
        }
    }

    /// Creates a value conversion error.
    pub fn value_conversion(
        device: impl Into<String>,
        operation: Operation,
        resource: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ValueConversion {
            device: device.into(),
            operation,
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(device: impl Into<String>, operation: Operation, timeout: Duration) -> Self {
        Self::Timeout {
            device: device.into(),
            operation,
            timeout,
        }
    }

    /// Creates a not-supported error.
    pub fn not_supported(operation: Operation) -> Self {
        Self::NotSupported { operation }
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the device this error refers to, if any.
    pub fn device(&self) -> Option<&str> {
        match self {
            Self::Config { device, .. }
            | Self::DeviceState { device, .. }
            | Self::Connection { device, .. }
            | Self::NotFound { device, .. }
            | Self::Parse { device, .. }
            | Self::Protocol { device, .. }
            | Self::NotAllowed { device, .. }
            | Self::ValueConversion { device, .. }
            | Self::Timeout { device, .. } => Some(device),
            Self::NotSupported { .. } => None,
        }
    }

    /// Returns the operation that failed.
    pub fn operation(&self) -> Operation {
        match self {
            Self::Config { operation, .. }
            | Self::DeviceState { operation, .. }
            | Self::Connection { operation, .. }
            | Self::NotFound { operation, .. }
            | Self::Parse { operation, .. }
            | Self::Protocol { operation, .. }
            | Self::NotAllowed { operation, .. }
            | Self::ValueConversion { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::NotSupported { operation } => *operation,
        }
    }

    /// Returns `true` if calling again later may succeed.
    ///
    /// The driver never retries on its own; this is a hint for the host.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::DeviceState { .. }
        )
    }

    /// Returns the error kind as a string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::DeviceState { .. } => "device_state",
            Self::Connection { .. } => "connection",
            Self::NotFound { .. } => "not_found",
            Self::Parse { .. } => "parse",
            Self::Protocol { .. } => "protocol",
            Self::NotAllowed { .. } => "not_allowed",
            Self::ValueConversion { .. } => "value_conversion",
            Self::Timeout { .. } => "timeout",
            Self::NotSupported { .. } => "not_supported",
        }
    }

    /// Returns a coarse HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Config { .. } | Self::Parse { .. } | Self::ValueConversion { .. } => 400,
            Self::NotAllowed { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::DeviceState { .. } => 423,
            Self::NotSupported { .. } => 501,
            Self::Protocol { .. } => 502,
            Self::Connection { .. } => 503,
            Self::Timeout { .. } => 504,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_message_names_device_and_operation() {
        let err = DriverError::not_found("pump-7", Operation::Call, "method 'Reset'");
        assert_eq!(err.to_string(), "[pump-7] call: method 'Reset' not found");

        let err = DriverError::device_state(
            "pump-7",
            Operation::Write,
            AdminState::Locked,
            OperatingState::Up,
        );
        let msg = err.to_string();
        assert!(msg.contains("pump-7"));
        assert!(msg.contains("write"));
        assert!(msg.contains("LOCKED"));
    }

    #[test]
    fn test_connection_keeps_source() {
        let cause = DriverError::config("pump-7", Operation::Connect, "Endpoint is required");
        let err = DriverError::connection_with("pump-7", Operation::Write, "reconnect failed", cause);

        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("Endpoint is required"));
        assert_eq!(err.error_type(), "connection");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DriverError::config("d", Operation::Validate, "x").status_code(), 400);
        assert_eq!(DriverError::parse("d", Operation::Read, "ns=x", "bad").status_code(), 400);
        assert_eq!(DriverError::not_found("d", Operation::Read, "device").status_code(), 404);
        assert_eq!(
            DriverError::timeout("d", Operation::Read, Duration::from_secs(1)).status_code(),
            504
        );
        assert_eq!(DriverError::not_supported(Operation::Discover).status_code(), 501);
    }

    #[test]
    fn test_not_allowed_is_permanent() {
        let err = DriverError::not_allowed("pump-7", Operation::Call, "method 'Calibrate'");
        assert_eq!(err.to_string(), "[pump-7] call: method 'Calibrate' not allowed");
        assert_eq!(err.error_type(), "not_allowed");
        assert_eq!(err.status_code(), 403);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_not_supported_has_no_device() {
        let err = DriverError::not_supported(Operation::Discover);
        assert_eq!(err.device(), None);
        assert_eq!(err.operation(), Operation::Discover);
        assert!(!err.is_retryable());
    }
}
