// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA specific types.
//!
//! - [`NodeId`]: parsed node identifiers
//! - [`SecurityPolicy`] / [`SecurityMode`]: the enumerated security settings
//! - [`OpcUaConfig`]: the per-device protocol properties

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use edgeua_core::types::{lookup, Device, ProtocolProperties};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, NodeIdError};

/// Protocol key under which a device carries its OPC UA properties.
pub const PROTOCOL_KEY: &str = "opcua";

/// Resource attribute keys.
pub mod attributes {
    /// Node identifier of a readable/writable variable.
    pub const NODE_ID: &str = "nodeId";
    /// Object owning a method.
    pub const OBJECT_ID: &str = "objectId";
    /// Method node identifier.
    pub const METHOD_ID: &str = "methodId";
    /// Declared input parameter names of a method.
    pub const INPUT_MAP: &str = "inputMap";
}

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA Node Identifier.
///
/// A NodeId consists of a namespace index and an identifier which can be
/// numeric, string, GUID, or opaque (byte string).
///
/// # Examples
///
/// ```
/// use edgeua_opcua::types::NodeId;
///
/// let parsed: NodeId = "ns=2;s=Boiler.Temperature".parse().unwrap();
/// assert_eq!(parsed, NodeId::string(2, "Boiler.Temperature"));
/// assert_eq!(parsed.to_string(), "ns=2;s=Boiler.Temperature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Formats the node ID as `ns=<namespace>;{i|s|g|b}=<identifier>`.
    ///
    /// The namespace prefix is omitted for namespace 0.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=1001` / `s=MyNode` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NodeIdError::Empty);
        }

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest.split_once(';').ok_or_else(|| NodeIdError::InvalidIdentifier {
                    input: s.to_string(),
                    reason: "missing identifier after namespace".to_string(),
                })?;
                let ns: u16 = ns.parse().map_err(|_| NodeIdError::InvalidNamespace {
                    input: s.to_string(),
                })?;
                (ns, id)
            }
            None => (0, s),
        };

        let invalid = |reason: String| NodeIdError::InvalidIdentifier {
            input: s.to_string(),
            reason,
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| invalid(format!("'{}' is not a numeric identifier", id)))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            if id.is_empty() {
                return Err(invalid("string identifier is empty".to_string()));
            }
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| invalid(format!("invalid GUID: {}", e)))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| invalid(format!("invalid base64: {}", e)))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(NodeIdError::UnknownType { input: s.to_string() });
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// OPC UA node identifier kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// Message security mode of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityMode {
    /// No security.
    #[default]
    None,
    /// Messages are signed.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Returns the configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }

    /// Returns the `MessageSecurityMode` wire value.
    pub const fn to_value(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Sign => 2,
            Self::SignAndEncrypt => 3,
        }
    }

    /// Creates from a `MessageSecurityMode` wire value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::None),
            2 => Some(Self::Sign),
            3 => Some(Self::SignAndEncrypt),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Sign" => Ok(Self::Sign),
            "SignAndEncrypt" => Ok(Self::SignAndEncrypt),
            other => Err(ConfigurationError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// SecurityPolicy
// =============================================================================

/// Security policy of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityPolicy {
    /// No security.
    #[default]
    None,
    /// Basic128Rsa15 (deprecated, still offered by older servers).
    Basic128Rsa15,
    /// Basic256 (deprecated).
    Basic256,
    /// Basic256Sha256.
    Basic256Sha256,
}

impl SecurityPolicy {
    const URI_PREFIX: &'static str = "http://opcfoundation.org/UA/SecurityPolicy#";

    /// Returns the configuration name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic128Rsa15 => "Basic128Rsa15",
            Self::Basic256 => "Basic256",
            Self::Basic256Sha256 => "Basic256Sha256",
        }
    }

    /// Returns the policy URI advertised by servers.
    pub fn uri(&self) -> String {
        format!("{}{}", Self::URI_PREFIX, self.name())
    }

    /// Creates from a policy URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        uri.strip_prefix(Self::URI_PREFIX)
            .and_then(|name| name.parse().ok())
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Basic128Rsa15" => Ok(Self::Basic128Rsa15),
            "Basic256" => Ok(Self::Basic256),
            "Basic256Sha256" => Ok(Self::Basic256Sha256),
            other => Err(ConfigurationError::InvalidPolicy {
                value: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// OpcUaConfig
// =============================================================================

/// Validated OPC UA protocol properties of one device.
///
/// # Examples
///
/// ```
/// use edgeua_opcua::types::{OpcUaConfig, SecurityPolicy};
/// use serde_json::json;
///
/// let props = serde_json::from_value(json!({
///     "Endpoint": "opc.tcp://plc:4840",
///     "Policy": "None",
///     "Mode": "None",
///     "Resources": "Temperature,Pressure",
/// })).unwrap();
///
/// let config = OpcUaConfig::from_properties(&props).unwrap();
/// assert_eq!(config.policy, SecurityPolicy::None);
/// assert_eq!(config.resources, vec!["Temperature", "Pressure"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpcUaConfig {
    /// Server endpoint URL.
    pub endpoint: String,
    /// Security policy.
    pub policy: SecurityPolicy,
    /// Security mode.
    pub mode: SecurityMode,
    /// Client certificate path.
    pub cert_file: Option<String>,
    /// Client private key path.
    pub key_file: Option<String>,
    /// Resources to subscribe to, in order.
    pub resources: Vec<String>,
}

impl OpcUaConfig {
    /// Property key of the endpoint URL.
    pub const ENDPOINT: &'static str = "Endpoint";
    /// Property key of the security policy.
    pub const POLICY: &'static str = "Policy";
    /// Property key of the security mode.
    pub const MODE: &'static str = "Mode";
    /// Property key of the certificate path.
    pub const CERT_FILE: &'static str = "CertFile";
    /// Property key of the private key path.
    pub const KEY_FILE: &'static str = "KeyFile";
    /// Property key of the subscribed resource list.
    pub const RESOURCES: &'static str = "Resources";

    /// Extracts and validates the OPC UA properties of a device.
    pub fn from_device(device: &Device) -> Result<Self, ConfigurationError> {
        let props = device
            .protocol(PROTOCOL_KEY)
            .ok_or_else(|| ConfigurationError::MissingProtocol {
                protocol: PROTOCOL_KEY.to_string(),
            })?;
        Self::from_properties(props)
    }

    /// Parses and validates a property map.
    pub fn from_properties(props: &ProtocolProperties) -> Result<Self, ConfigurationError> {
        let endpoint = string_property(props, Self::ENDPOINT)?
            .ok_or_else(|| ConfigurationError::missing_field(Self::ENDPOINT))?;

        let policy: SecurityPolicy = string_property(props, Self::POLICY)?
            .unwrap_or_default()
            .parse()?;
        let mode: SecurityMode = string_property(props, Self::MODE)?
            .unwrap_or_default()
            .parse()?;

        let config = Self {
            endpoint,
            policy,
            mode,
            cert_file: string_property(props, Self::CERT_FILE)?,
            key_file: string_property(props, Self::KEY_FILE)?,
            resources: resources_property(props)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigurationError::missing_field(Self::ENDPOINT));
        }
        if self.requires_credentials() {
            if self.cert_file.is_none() {
                return Err(ConfigurationError::MissingCredential {
                    field: Self::CERT_FILE.to_string(),
                });
            }
            if self.key_file.is_none() {
                return Err(ConfigurationError::MissingCredential {
                    field: Self::KEY_FILE.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns `true` unless both policy and mode are `None`.
    pub fn requires_credentials(&self) -> bool {
        !(self.policy == SecurityPolicy::None && self.mode == SecurityMode::None)
    }
}

/// Reads an optional string property. Empty strings count as absent.
fn string_property(props: &ProtocolProperties, key: &str) -> Result<Option<String>, ConfigurationError> {
    match lookup(props, key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ConfigurationError::invalid_field(
            key,
            format!("expected a string, got {}", other),
        )),
    }
}

/// Reads the resource list, accepting an array or a comma-separated string.
///
/// Entries keep their position, including blank ones, so subscription handles
/// derived from list indices stay stable.
fn resources_property(props: &ProtocolProperties) -> Result<Vec<String>, ConfigurationError> {
    let key = OpcUaConfig::RESOURCES;
    match lookup(props, key) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(Vec::new()),
        Some(serde_json::Value::String(s)) => Ok(s.split(',').map(|r| r.trim().to_string()).collect()),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::String(s) => Ok(s.trim().to_string()),
                other => Err(ConfigurationError::invalid_field(
                    key,
                    format!("expected resource names, got {}", other),
                )),
            })
            .collect(),
        Some(other) => Err(ConfigurationError::invalid_field(
            key,
            format!("expected a list or comma-separated string, got {}", other),
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: serde_json::Value) -> ProtocolProperties {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_node_id_parse_forms() {
        assert_eq!("ns=2;i=1001".parse::<NodeId>().unwrap(), NodeId::numeric(2, 1001));
        assert_eq!("i=85".parse::<NodeId>().unwrap(), NodeId::numeric(0, 85));
        assert_eq!("s=Counter".parse::<NodeId>().unwrap(), NodeId::string(0, "Counter"));
        assert_eq!(
            "ns=3;b=SGVsbG8=".parse::<NodeId>().unwrap(),
            NodeId::opaque(3, b"Hello".to_vec())
        );

        let guid: NodeId = "ns=1;g=550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert!(matches!(guid.identifier, NodeIdentifier::Guid(_)));
    }

    #[test]
    fn test_node_id_string_keeps_semicolons() {
        let node: NodeId = "ns=2;s=Line;1.Motor".parse().unwrap();
        assert_eq!(node, NodeId::string(2, "Line;1.Motor"));
    }

    #[test]
    fn test_node_id_parse_errors() {
        assert_eq!("".parse::<NodeId>(), Err(NodeIdError::Empty));
        assert!(matches!(
            "ns=abc;i=1".parse::<NodeId>(),
            Err(NodeIdError::InvalidNamespace { .. })
        ));
        assert!(matches!(
            "ns=2;i=notanumber".parse::<NodeId>(),
            Err(NodeIdError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            "ns=2;x=1".parse::<NodeId>(),
            Err(NodeIdError::UnknownType { .. })
        ));
        assert!(matches!("ns=2".parse::<NodeId>(), Err(NodeIdError::InvalidIdentifier { .. })));
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::numeric(0, 85).to_string(), "i=85");
        assert_eq!(NodeId::string(2, "A.B").to_string(), "ns=2;s=A.B");
    }

    #[test]
    fn test_security_names() {
        assert_eq!("Basic256Sha256".parse::<SecurityPolicy>().unwrap(), SecurityPolicy::Basic256Sha256);
        assert!("Aes256".parse::<SecurityPolicy>().is_err());
        assert!("none".parse::<SecurityMode>().is_err());
        assert_eq!(
            SecurityPolicy::from_uri("http://opcfoundation.org/UA/SecurityPolicy#Basic256"),
            Some(SecurityPolicy::Basic256)
        );
        assert_eq!(SecurityMode::from_value(3), Some(SecurityMode::SignAndEncrypt));
    }

    #[test]
    fn test_config_requires_endpoint() {
        let err = OpcUaConfig::from_properties(&props(json!({"Policy": "None", "Mode": "None"})));
        assert_eq!(err, Err(ConfigurationError::missing_field("Endpoint")));
    }

    #[test]
    fn test_config_requires_policy_and_mode() {
        let err = OpcUaConfig::from_properties(&props(json!({"Endpoint": "opc.tcp://h:4840", "Mode": "None"})));
        assert!(matches!(err, Err(ConfigurationError::InvalidPolicy { .. })));
    }

    #[test]
    fn test_config_credentials_unless_none_none() {
        let secured = props(json!({
            "Endpoint": "opc.tcp://h:4840",
            "Policy": "Basic256Sha256",
            "Mode": "None",
            "KeyFile": "/pki/key.pem",
        }));
        assert_eq!(
            OpcUaConfig::from_properties(&secured),
            Err(ConfigurationError::MissingCredential { field: "CertFile".into() })
        );

        let complete = props(json!({
            "Endpoint": "opc.tcp://h:4840",
            "Policy": "Basic256Sha256",
            "Mode": "SignAndEncrypt",
            "CertFile": "/pki/cert.der",
            "KeyFile": "/pki/key.pem",
        }));
        let config = OpcUaConfig::from_properties(&complete).unwrap();
        assert!(config.requires_credentials());
    }

    #[test]
    fn test_config_resources_forms() {
        let from_list = OpcUaConfig::from_properties(&props(json!({
            "Endpoint": "opc.tcp://h:4840", "Policy": "None", "Mode": "None",
            "Resources": ["a", "b"],
        })))
        .unwrap();
        assert_eq!(from_list.resources, vec!["a", "b"]);

        let from_string = OpcUaConfig::from_properties(&props(json!({
            "Endpoint": "opc.tcp://h:4840", "Policy": "None", "Mode": "None",
            "Resources": "a, ,c",
        })))
        .unwrap();
        assert_eq!(from_string.resources, vec!["a", "", "c"]);

        let bad = OpcUaConfig::from_properties(&props(json!({
            "Endpoint": "opc.tcp://h:4840", "Policy": "None", "Mode": "None",
            "Resources": 5,
        })));
        assert!(matches!(bad, Err(ConfigurationError::InvalidField { .. })));
    }

    #[test]
    fn test_config_from_device() {
        let device = Device::new("plc");
        assert!(matches!(
            OpcUaConfig::from_device(&device),
            Err(ConfigurationError::MissingProtocol { .. })
        ));
    }
}
