// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built devices, resources and configuration files for a small boiler
//! plant served from one OPC UA endpoint.

use edgeua_core::{DeviceResource, ValueType};
use edgeua_opcua::NodeId;

/// Endpoint every fixture device points at.
pub const ENDPOINT: &str = "opc.tcp://127.0.0.1:4840";

/// Profile holding the boiler resources.
pub const BOILER_PROFILE: &str = "boiler";

/// Name of the default fixture device.
pub const BOILER_DEVICE: &str = "boiler-1";

// =============================================================================
// Resource Fixtures
// =============================================================================

/// Fixture providing the boiler profile's resources.
pub struct ResourceFixtures;

impl ResourceFixtures {
    /// `Temperature`, Float64 at `ns=2;s=Temperature`.
    pub fn temperature() -> DeviceResource {
        DeviceResource::new("Temperature", ValueType::Float64).with_attribute("nodeId", "ns=2;s=Temperature")
    }

    /// `TemperatureAlias`, a second resource on the temperature node.
    pub fn temperature_alias() -> DeviceResource {
        DeviceResource::new("TemperatureAlias", ValueType::Float32).with_attribute("nodeId", "ns=2;s=Temperature")
    }

    /// `Pressure`, Int32 at `ns=2;i=1001`.
    pub fn pressure() -> DeviceResource {
        DeviceResource::new("Pressure", ValueType::Int32).with_attribute("nodeId", "ns=2;i=1001")
    }

    /// `Running`, Bool at `ns=2;s=Running`.
    pub fn running() -> DeviceResource {
        DeviceResource::new("Running", ValueType::Bool).with_attribute("nodeId", "ns=2;s=Running")
    }

    /// `Setpoint`, writable Float64 at `ns=2;s=Setpoint`.
    pub fn setpoint() -> DeviceResource {
        DeviceResource::new("Setpoint", ValueType::Float64).with_attribute("nodeId", "ns=2;s=Setpoint")
    }

    /// `Reset`, a method on the boiler object.
    pub fn reset_method() -> DeviceResource {
        DeviceResource::new("Reset", ValueType::String)
            .with_attribute("objectId", "ns=2;s=Boiler")
            .with_attribute("methodId", "ns=2;s=Boiler.Reset")
            .with_attribute("inputMap", "mode,delay")
    }

    /// `Calibrate`, a hidden method.
    pub fn hidden_method() -> DeviceResource {
        DeviceResource::new("Calibrate", ValueType::String)
            .with_attribute("objectId", "ns=2;s=Boiler")
            .with_attribute("methodId", "ns=2;s=Boiler.Calibrate")
            .hidden(true)
    }

    /// Every boiler resource.
    pub fn boiler_profile() -> Vec<DeviceResource> {
        vec![
            Self::temperature(),
            Self::temperature_alias(),
            Self::pressure(),
            Self::running(),
            Self::setpoint(),
            Self::reset_method(),
            Self::hidden_method(),
        ]
    }
}

// =============================================================================
// Node Fixtures
// =============================================================================

/// Node ids used by the resource fixtures.
pub struct NodeFixtures;

impl NodeFixtures {
    /// Temperature node.
    pub fn temperature() -> NodeId {
        NodeId::string(2, "Temperature")
    }

    /// Pressure node.
    pub fn pressure() -> NodeId {
        NodeId::numeric(2, 1001)
    }

    /// Running node.
    pub fn running() -> NodeId {
        NodeId::string(2, "Running")
    }

    /// Setpoint node.
    pub fn setpoint() -> NodeId {
        NodeId::string(2, "Setpoint")
    }

    /// Boiler object node.
    pub fn boiler() -> NodeId {
        NodeId::string(2, "Boiler")
    }

    /// Reset method node.
    pub fn reset() -> NodeId {
        NodeId::string(2, "Boiler.Reset")
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Configuration documents in each supported format.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// A YAML config with one profile and two devices.
    pub fn yaml() -> &'static str {
        r#"
service:
  name: edgeua-test
  request_timeout: 5s
api:
  port: 59990
logging:
  level: debug
  format: json
profiles:
  - name: boiler
    resources:
      - name: Temperature
        value_type: Float64
        attributes:
          nodeId: "ns=2;s=Temperature"
      - name: Reset
        value_type: String
        attributes:
          objectId: "ns=2;s=Boiler"
          methodId: "ns=2;s=Boiler.Reset"
devices:
  - name: boiler-1
    profile: boiler
    protocols:
      opcua:
        Endpoint: "opc.tcp://127.0.0.1:4840"
        Policy: "None"
        Mode: "None"
        Resources: "Temperature"
  - name: boiler-2
    profile: boiler
    admin_state: LOCKED
    protocols:
      opcua:
        Endpoint: "opc.tcp://127.0.0.1:4841"
        Policy: Basic256Sha256
        Mode: SignAndEncrypt
        CertFile: certs/client.pem
        KeyFile: certs/client.key
"#
    }

    /// The same service as [`yaml`](Self::yaml), one device, in TOML.
    pub fn toml() -> &'static str {
        r#"
[service]
name = "edgeua-test"

[[profiles]]
name = "boiler"

[[profiles.resources]]
name = "Temperature"
value_type = "Float64"
attributes = { nodeId = "ns=2;s=Temperature" }

[[devices]]
name = "boiler-1"
profile = "boiler"

[devices.protocols.opcua]
Endpoint = "opc.tcp://127.0.0.1:4840"
Policy = "None"
Mode = "None"
Resources = ["Temperature"]
"#
    }

    /// A JSON config with one device.
    pub fn json() -> &'static str {
        r#"{
  "service": { "name": "edgeua-test" },
  "profiles": [
    { "name": "boiler", "resources": [
      { "name": "Temperature", "value_type": "Float64", "attributes": { "nodeId": "ns=2;s=Temperature" } }
    ] }
  ],
  "devices": [
    { "name": "boiler-1", "profile": "boiler",
      "protocols": { "opcua": { "Endpoint": "opc.tcp://127.0.0.1:4840", "Policy": "None", "Mode": "None" } } }
  ]
}"#
    }
}
