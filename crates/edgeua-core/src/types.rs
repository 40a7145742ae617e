// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Host-facing data model.
//!
//! These types mirror what the host device framework hands to a driver:
//! device metadata, resource descriptors, command requests and the typed
//! values exchanged in both directions.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form protocol properties of a device, keyed by property name.
pub type ProtocolProperties = HashMap<String, serde_json::Value>;

/// Free-form attributes of a device resource.
pub type Attributes = HashMap<String, serde_json::Value>;

/// Looks up a property or attribute by key.
///
/// An exact match wins; otherwise keys are compared ignoring ASCII case, since
/// some configuration sources fold key case on load.
pub fn lookup<'a, V>(map: &'a HashMap<String, V>, key: &str) -> Option<&'a V> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

// =============================================================================
// Device States
// =============================================================================

/// Administrative state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdminState {
    /// Commands and connections are allowed.
    #[default]
    Unlocked,
    /// The device has been locked by an operator.
    Locked,
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlocked => write!(f, "UNLOCKED"),
            Self::Locked => write!(f, "LOCKED"),
        }
    }
}

impl FromStr for AdminState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UNLOCKED" => Ok(Self::Unlocked),
            "LOCKED" => Ok(Self::Locked),
            other => Err(format!("unknown admin state '{}'", other)),
        }
    }
}

/// Operating state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperatingState {
    /// The device is reachable.
    #[default]
    Up,
    /// The device has been reported down.
    Down,
}

impl fmt::Display for OperatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

impl FromStr for OperatingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            other => Err(format!("unknown operating state '{}'", other)),
        }
    }
}

// =============================================================================
// Device
// =============================================================================

/// A device registered with the host.
///
/// # Examples
///
/// ```
/// use edgeua_core::types::{AdminState, Device};
///
/// let device = Device::new("boiler-1").with_admin_state(AdminState::Locked);
/// assert!(device.is_locked_or_down());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device name.
    pub name: String,

    /// Administrative state.
    #[serde(default)]
    pub admin_state: AdminState,

    /// Operating state.
    #[serde(default)]
    pub operating_state: OperatingState,

    /// Name of the device profile holding the resources.
    #[serde(default)]
    pub profile_name: String,

    /// Protocol properties keyed by protocol name (e.g. `opcua`).
    #[serde(default)]
    pub protocols: HashMap<String, ProtocolProperties>,
}

impl Device {
    /// Creates an unlocked, up device with no protocols.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin_state: AdminState::Unlocked,
            operating_state: OperatingState::Up,
            profile_name: String::new(),
            protocols: HashMap::new(),
        }
    }

    /// Sets the administrative state.
    pub fn with_admin_state(mut self, state: AdminState) -> Self {
        self.admin_state = state;
        self
    }

    /// Sets the operating state.
    pub fn with_operating_state(mut self, state: OperatingState) -> Self {
        self.operating_state = state;
        self
    }

    /// Sets the profile name.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile_name = profile.into();
        self
    }

    /// Adds protocol properties under the given protocol name.
    pub fn with_protocol(mut self, protocol: impl Into<String>, props: ProtocolProperties) -> Self {
        self.protocols.insert(protocol.into(), props);
        self
    }

    /// Returns the properties of a protocol, if present.
    pub fn protocol(&self, protocol: &str) -> Option<&ProtocolProperties> {
        lookup(&self.protocols, protocol)
    }

    /// Returns `true` if no connection may be attempted for this device.
    #[inline]
    pub fn is_locked_or_down(&self) -> bool {
        self.admin_state == AdminState::Locked || self.operating_state == OperatingState::Down
    }
}

// =============================================================================
// ValueType
// =============================================================================

/// Declared value type of a device resource.
///
/// The names match the host framework's value type strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Signed 8-bit integer.
    Int8,
    /// Signed 16-bit integer.
    Int16,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Raw bytes.
    Binary,
    /// Structured object.
    Object,
}

impl ValueType {
    /// All known value types.
    pub const ALL: [ValueType; 14] = [
        Self::Bool,
        Self::String,
        Self::Uint8,
        Self::Uint16,
        Self::Uint32,
        Self::Uint64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float32,
        Self::Float64,
        Self::Binary,
        Self::Object,
    ];

    /// Returns the host framework name of this type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Uint8 => "Uint8",
            Self::Uint16 => "Uint16",
            Self::Uint32 => "Uint32",
            Self::Uint64 => "Uint64",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Binary => "Binary",
            Self::Object => "Object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown value type '{}'", s))
    }
}

// =============================================================================
// Value
// =============================================================================

/// A native value carried by a [`CommandValue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Signed 8-bit integer
    Int8(i8),
    /// Signed 16-bit integer
    Int16(i16),
    /// Signed 32-bit integer
    Int32(i32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Unsigned 8-bit integer
    UInt8(u8),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Array of values
    Array(Vec<Value>),
    /// Date and time
    DateTime(DateTime<Utc>),
    /// Null/undefined value
    Null,
}

impl Value {
    /// Returns the type name of this value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::UInt8(_) => "uint8",
            Value::UInt16(_) => "uint16",
            Value::UInt32(_) => "uint32",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::DateTime(_) => "datetime",
            Value::Null => "null",
        }
    }

    /// Returns the declared type this value natively belongs to, if any.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int8(_) => Some(ValueType::Int8),
            Value::Int16(_) => Some(ValueType::Int16),
            Value::Int32(_) => Some(ValueType::Int32),
            Value::Int64(_) => Some(ValueType::Int64),
            Value::UInt8(_) => Some(ValueType::Uint8),
            Value::UInt16(_) => Some(ValueType::Uint16),
            Value::UInt32(_) => Some(ValueType::Uint32),
            Value::UInt64(_) => Some(ValueType::Uint64),
            Value::Float32(_) => Some(ValueType::Float32),
            Value::Float64(_) => Some(ValueType::Float64),
            Value::String(_) => Some(ValueType::String),
            Value::Bytes(_) => Some(ValueType::Binary),
            Value::Array(_) | Value::DateTime(_) | Value::Null => None,
        }
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to convert this value to a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::UInt8(v) => Some(*v as i64),
            Value::UInt16(v) => Some(*v as i64),
            Value::UInt32(v) => Some(*v as i64),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int8(v) => Some(*v as f64),
            Value::Int16(v) => Some(*v as f64),
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::UInt8(v) => Some(*v as f64),
            Value::UInt16(v) => Some(*v as f64),
            Value::UInt32(v) => Some(*v as f64),
            Value::UInt64(v) => Some(*v as f64),
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get this value as a string reference.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Converts this value to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int8(v) => serde_json::json!(*v),
            Value::Int16(v) => serde_json::json!(*v),
            Value::Int32(v) => serde_json::json!(*v),
            Value::Int64(v) => serde_json::json!(*v),
            Value::UInt8(v) => serde_json::json!(*v),
            Value::UInt16(v) => serde_json::json!(*v),
            Value::UInt32(v) => serde_json::json!(*v),
            Value::UInt64(v) => serde_json::json!(*v),
            Value::Float32(v) => serde_json::json!(*v),
            Value::Float64(v) => serde_json::json!(*v),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Bytes(v) => serde_json::json!(v),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(|v| v.to_json()).collect()),
            Value::DateTime(dt) => serde_json::json!(dt.to_rfc3339()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Array(v) => {
                write!(f, "[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// Resources and Commands
// =============================================================================

/// A resource declared by a device profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceResource {
    /// Resource name, unique within the profile.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Hidden resources cannot be invoked as methods.
    #[serde(default)]
    pub is_hidden: bool,

    /// Declared value type.
    pub value_type: ValueType,

    /// Protocol attributes (`nodeId`, `objectId`, `methodId`, `inputMap`).
    #[serde(default)]
    pub attributes: Attributes,
}

impl DeviceResource {
    /// Creates a visible resource with no attributes.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            is_hidden: false,
            value_type,
            attributes: Attributes::new(),
        }
    }

    /// Adds a string attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Marks the resource hidden.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.is_hidden = hidden;
        self
    }

    /// Builds a command request addressing this resource.
    pub fn to_request(&self) -> CommandRequest {
        CommandRequest {
            resource_name: self.name.clone(),
            value_type: self.value_type,
            attributes: self.attributes.clone(),
        }
    }
}

/// A single read or write request issued by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Target resource.
    pub resource_name: String,
    /// Declared value type of the resource.
    pub value_type: ValueType,
    /// Protocol attributes copied from the resource.
    #[serde(default)]
    pub attributes: Attributes,
}

impl CommandRequest {
    /// Creates a request with no attributes.
    pub fn new(resource_name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            resource_name: resource_name.into(),
            value_type,
            attributes: Attributes::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if the attribute is present.
    #[inline]
    pub fn has_attribute(&self, key: &str) -> bool {
        lookup(&self.attributes, key).is_some()
    }
}

/// A typed value exchanged with the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandValue {
    /// Resource the value belongs to.
    pub resource_name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Native value.
    pub value: Value,
    /// Auxiliary tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Origin timestamp in nanoseconds since the Unix epoch.
    pub origin: i64,
}

impl CommandValue {
    /// Creates a value stamped with the current time.
    pub fn new(resource_name: impl Into<String>, value_type: ValueType, value: Value) -> Self {
        Self {
            resource_name: resource_name.into(),
            value_type,
            value,
            tags: HashMap::new(),
            origin: now_nanos(),
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Overrides the origin timestamp.
    pub fn with_origin(mut self, origin: DateTime<Utc>) -> Self {
        self.origin = origin.timestamp_nanos_opt().unwrap_or_else(now_nanos);
        self
    }
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})={}", self.resource_name, self.value_type, self.value)
    }
}

/// A batch of asynchronous readings pushed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncValues {
    /// Device the readings belong to.
    pub device_name: String,
    /// The readings.
    pub values: Vec<CommandValue>,
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
