// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for edgeua.
//!
//! # Example
//!
//! ```yaml
//! service:
//!   name: edgeua
//!   request_timeout: 10s
//!
//! api:
//!   port: 59997
//!
//! profiles:
//!   - name: boiler
//!     resources:
//!       - name: Temperature
//!         value_type: Float64
//!         attributes: { nodeId: "ns=2;s=Boiler.Temperature" }
//!
//! devices:
//!   - name: boiler-1
//!     profile: boiler
//!     protocols:
//!       opcua:
//!         Endpoint: opc.tcp://10.0.0.5:4840
//!         Policy: None
//!         Mode: None
//!         Resources: Temperature
//! ```

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use edgeua_core::types::{
    AdminState, Attributes, Device, DeviceResource, OperatingState, ProtocolProperties, ValueType,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "edgeua";

/// Default per-request timeout towards OPC UA servers.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 59997;

/// Default API request timeout.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeUaConfig {
    /// Service-wide settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// REST API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Device profiles.
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,

    /// Devices.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl EdgeUaConfig {
    /// Validates the configuration.
    ///
    /// Checks that profile and device names are unique, that every device's
    /// profile exists and that every resource declares a known value type.
    /// Protocol properties are not interpreted here.
    pub fn validate(&self) -> ConfigResult<()> {
        self.service.validate()?;
        self.api.validate()?;

        let mut profiles = HashSet::new();
        for profile in &self.profiles {
            if !profiles.insert(profile.name.as_str()) {
                return Err(ConfigError::duplicate_profile(&profile.name));
            }
            profile.validate()?;
        }

        let mut devices = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(ConfigError::validation("devices.name", "must not be empty"));
            }
            if !devices.insert(device.name.as_str()) {
                return Err(ConfigError::duplicate_device(&device.name));
            }
            if !profiles.contains(device.profile.as_str()) {
                return Err(ConfigError::unknown_profile(&device.name, &device.profile));
            }
        }

        Ok(())
    }

    /// Returns a profile by name.
    pub fn profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Returns a device by name.
    pub fn device(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|d| d.name == name)
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

/// Service-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service name, used in logs and the ping response.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Timeout applied to each OPC UA round-trip. Zero disables it.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl ServiceConfig {
    /// Validates the service settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("service.name", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// =============================================================================
// API Configuration
// =============================================================================

/// REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Whether the API server runs.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub host: IpAddr,

    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Per-request timeout.
    #[serde(default = "default_api_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_enabled() -> bool {
    true
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_api_timeout() -> Duration {
    DEFAULT_API_TIMEOUT
}

impl ApiConfig {
    /// Validates the API settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.enabled && self.port == 0 {
            return Err(ConfigError::validation("api.port", "must not be 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation("api.request_timeout", "must be positive"));
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_bind_address(),
            port: DEFAULT_API_PORT,
            request_timeout: DEFAULT_API_TIMEOUT,
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON lines.
    Json,
    /// Compact text.
    Compact,
}

// =============================================================================
// Profiles
// =============================================================================

/// A named set of device resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Profile name.
    pub name: String,

    /// Resources of the profile.
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

impl ProfileConfig {
    /// Validates the profile.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("profiles.name", "must not be empty"));
        }
        let mut names = HashSet::new();
        for resource in &self.resources {
            if !names.insert(resource.name.as_str()) {
                return Err(ConfigError::validation(
                    format!("profiles.{}.resources", self.name),
                    format!("duplicate resource '{}'", resource.name),
                ));
            }
            resource.value_type(&self.name)?;
        }
        Ok(())
    }

    /// Converts every resource into its descriptor.
    pub fn to_resources(&self) -> ConfigResult<Vec<DeviceResource>> {
        self.resources.iter().map(|r| r.to_resource(&self.name)).collect()
    }
}

/// One device resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Resource name.
    pub name: String,

    /// Free text.
    #[serde(default)]
    pub description: String,

    /// Hidden resources cannot be called as methods.
    #[serde(default)]
    pub hidden: bool,

    /// Declared value type, e.g. `Float64`.
    pub value_type: String,

    /// Protocol attributes such as `nodeId`.
    #[serde(default)]
    pub attributes: Attributes,
}

impl ResourceConfig {
    fn value_type(&self, profile: &str) -> ConfigResult<ValueType> {
        self.value_type.parse().map_err(|e: String| {
            ConfigError::validation(format!("profiles.{}.resources.{}.value_type", profile, self.name), e)
        })
    }

    /// Converts this entry into a resource descriptor.
    pub fn to_resource(&self, profile: &str) -> ConfigResult<DeviceResource> {
        let mut resource = DeviceResource::new(&self.name, self.value_type(profile)?).hidden(self.hidden);
        resource.description = self.description.clone();
        resource.attributes = self.attributes.clone();
        Ok(resource)
    }
}

// =============================================================================
// Devices
// =============================================================================

/// One device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Device name.
    pub name: String,

    /// Profile name.
    pub profile: String,

    /// Administrative state.
    #[serde(default)]
    pub admin_state: AdminState,

    /// Operating state.
    #[serde(default)]
    pub operating_state: OperatingState,

    /// Protocol properties keyed by protocol name.
    #[serde(default)]
    pub protocols: HashMap<String, ProtocolProperties>,
}

impl DeviceConfig {
    /// Converts this entry into the host's device model.
    pub fn to_device(&self) -> Device {
        let mut device = Device::new(&self.name)
            .with_admin_state(self.admin_state)
            .with_operating_state(self.operating_state)
            .with_profile(&self.profile);
        for (protocol, props) in &self.protocols {
            device = device.with_protocol(protocol, props.clone());
        }
        device
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str, value_type: &str) -> ResourceConfig {
        ResourceConfig {
            name: name.to_string(),
            description: String::new(),
            hidden: false,
            value_type: value_type.to_string(),
            attributes: Attributes::new(),
        }
    }

    fn config() -> EdgeUaConfig {
        EdgeUaConfig {
            profiles: vec![ProfileConfig {
                name: "boiler".to_string(),
                resources: vec![resource("Temperature", "Float64"), resource("Running", "Bool")],
            }],
            devices: vec![DeviceConfig {
                name: "boiler-1".to_string(),
                profile: "boiler".to_string(),
                admin_state: AdminState::Unlocked,
                operating_state: OperatingState::Up,
                protocols: HashMap::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = EdgeUaConfig::default();
        assert_eq!(config.service.name, "edgeua");
        assert_eq!(config.service.request_timeout, Duration::from_secs(10));
        assert_eq!(config.api.port, DEFAULT_API_PORT);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_duplicate_device() {
        let mut config = config();
        config.devices.push(config.devices[0].clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateDevice { name }) if name == "boiler-1"
        ));
    }

    #[test]
    fn test_unknown_profile() {
        let mut config = config();
        config.devices[0].profile = "chiller".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownProfile { .. })));
    }

    #[test]
    fn test_unknown_value_type() {
        let mut config = config();
        config.profiles[0].resources.push(resource("Mode", "Enum"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("value_type"));
    }

    #[test]
    fn test_to_device() {
        let mut entry = config().devices[0].clone();
        entry.admin_state = AdminState::Locked;
        let device = entry.to_device();
        assert_eq!(device.profile_name, "boiler");
        assert!(device.is_locked_or_down());
    }

    #[test]
    fn test_to_resources() {
        let resources = config().profiles[0].to_resources().unwrap();
        assert_eq!(resources[0].value_type, ValueType::Float64);
        assert_eq!(resources[1].value_type, ValueType::Bool);
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
