// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport abstraction layer.
//!
//! The session layer talks to the wire only through two traits:
//!
//! - [`OpcUaConnector`] discovers endpoints and opens connections
//! - [`OpcUaTransport`] is one open connection
//!
//! The `real-transport` feature provides implementations backed by the
//! `opcua` client stack; tests substitute their own doubles.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::types::{NodeId, OpcUaConfig};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// OPC UA status codes used by the driver.
pub mod status {
    /// `Good`.
    pub const GOOD: u32 = 0;
    /// `BadNodeIdUnknown`.
    pub const BAD_NODE_ID_UNKNOWN: u32 = 0x8034_0000;
    /// `BadTypeMismatch`.
    pub const BAD_TYPE_MISMATCH: u32 = 0x8074_0000;
    /// `BadNotWritable`.
    pub const BAD_NOT_WRITABLE: u32 = 0x803B_0000;

    /// Returns `true` for a good status.
    #[inline]
    pub fn is_good(code: u32) -> bool {
        code == GOOD
    }
}

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Transport is not connected.
    #[default]
    Disconnected,

    /// Transport is establishing connection.
    Connecting,

    /// Transport is connected and ready.
    Connected,

    /// Transport is reconnecting after a failure.
    Reconnecting,

    /// Transport has been closed and cannot be reused.
    Closed,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if a command must reconnect before using the transport.
    #[inline]
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, Self::Closed | Self::Disconnected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// =============================================================================
// OpcUaValue
// =============================================================================

/// Protocol-native value carried by the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OpcUaValue {
    /// Boolean value.
    Boolean(bool),

    /// Signed byte.
    SByte(i8),

    /// Unsigned byte.
    Byte(u8),

    /// 16-bit signed integer.
    Int16(i16),

    /// 16-bit unsigned integer.
    UInt16(u16),

    /// 32-bit signed integer.
    Int32(i32),

    /// 32-bit unsigned integer.
    UInt32(u32),

    /// 64-bit signed integer.
    Int64(i64),

    /// 64-bit unsigned integer.
    UInt64(u64),

    /// 32-bit float.
    Float(f32),

    /// 64-bit double.
    Double(f64),

    /// String value.
    String(String),

    /// Date/time value.
    DateTime(chrono::DateTime<chrono::Utc>),

    /// GUID value.
    Guid(uuid::Uuid),

    /// Byte string.
    ByteString(Vec<u8>),

    /// Array of values.
    Array(Vec<OpcUaValue>),

    /// Null value.
    #[default]
    Null,
}

impl OpcUaValue {
    /// Returns the OPC UA built-in type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::ByteString(_) => "ByteString",
            Self::Array(_) => "Array",
            Self::Null => "Null",
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for OpcUaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::SByte(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{}", v),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Service Results
// =============================================================================

/// Result of reading one node.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    /// Status code of the read.
    pub status_code: u32,

    /// The value, when the status is good.
    pub value: Option<OpcUaValue>,

    /// Source timestamp reported by the server.
    pub source_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl ReadResult {
    /// Creates a successful read result.
    pub fn good(value: OpcUaValue) -> Self {
        Self {
            status_code: status::GOOD,
            value: Some(value),
            source_timestamp: None,
        }
    }

    /// Creates a failed read result.
    pub fn bad(status_code: u32) -> Self {
        Self {
            status_code,
            value: None,
            source_timestamp: None,
        }
    }

    /// Returns `true` if the read was successful.
    #[inline]
    pub fn is_good(&self) -> bool {
        status::is_good(self.status_code)
    }
}

/// Result of a method call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallResult {
    /// Status code of the call.
    pub status_code: u32,

    /// Output arguments.
    pub outputs: Vec<OpcUaValue>,
}

/// An endpoint offered by a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescription {
    /// Endpoint URL as advertised.
    pub endpoint_url: String,

    /// Security policy URI.
    pub security_policy_uri: String,

    /// `MessageSecurityMode` wire value.
    pub security_mode: u32,

    /// Relative security level; higher is stronger.
    pub security_level: u8,
}

/// Parameters for opening a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Device the connection belongs to, used as session name.
    pub device_name: String,

    /// Protocol properties of the device.
    pub config: OpcUaConfig,
}

// =============================================================================
// Notifications
// =============================================================================

/// One changed monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemNotification {
    /// Client handle assigned when the item was created.
    pub client_handle: u32,

    /// New value, absent when the server sent none.
    pub value: Option<OpcUaValue>,
}

/// A data change notification for one subscription.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChangeNotification {
    /// Changed items.
    pub items: Vec<MonitoredItemNotification>,
}

/// Channel half the transport pushes notifications into.
pub type NotificationSender = mpsc::UnboundedSender<DataChangeNotification>;

// =============================================================================
// OpcUaConnector Trait
// =============================================================================

/// Opens OPC UA connections.
#[async_trait]
pub trait OpcUaConnector: Send + Sync {
    /// Lists the endpoints a server offers at `url`.
    async fn discover_endpoints(&self, url: &str) -> TransportResult<Vec<EndpointDescription>>;

    /// Opens a session on the selected endpoint.
    async fn open(
        &self,
        endpoint: &EndpointDescription,
        settings: &ConnectionSettings,
    ) -> TransportResult<Arc<dyn OpcUaTransport>>;
}

// =============================================================================
// OpcUaTransport Trait
// =============================================================================

/// One open OPC UA connection.
///
/// Implementations must be `Send + Sync`; the session layer serializes
/// connection replacement but commands may use the same transport
/// concurrently.
#[async_trait]
pub trait OpcUaTransport: Send + Sync {
    /// Returns the current connection state.
    fn state(&self) -> TransportState;

    /// Closes the connection.
    async fn close(&self) -> TransportResult<()>;

    /// Reads the value attribute of several nodes in one request.
    ///
    /// The result has one entry per node, in order.
    async fn read_values(&self, nodes: &[NodeId], max_age: Duration) -> TransportResult<Vec<ReadResult>>;

    /// Writes the value attribute of one node and returns its status.
    async fn write_value(&self, node: &NodeId, value: OpcUaValue) -> TransportResult<u32>;

    /// Calls a method on an object.
    async fn call_method(
        &self,
        object: &NodeId,
        method: &NodeId,
        arguments: Vec<OpcUaValue>,
    ) -> TransportResult<CallResult>;

    /// Creates a subscription whose notifications are sent to `sink`.
    ///
    /// Returns the subscription id.
    async fn create_subscription(&self, interval: Duration, sink: NotificationSender) -> TransportResult<u32>;

    /// Adds a monitored item to a subscription and returns its status.
    async fn create_monitored_item(
        &self,
        subscription_id: u32,
        node: &NodeId,
        client_handle: u32,
    ) -> TransportResult<u32>;
}

// =============================================================================
// Tests
// =============================================================================
