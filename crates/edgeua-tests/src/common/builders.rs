// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Builders
//!
//! Builders for devices and for a fully wired driver backed by mocks.

use std::sync::Arc;
use std::time::Duration;

use edgeua_core::{AdminState, Device, DeviceResource, OperatingState, ProtocolDriver, ProtocolProperties};
use edgeua_opcua::{DeviceRegistry, SessionSettings};

use super::fixtures::{ResourceFixtures, BOILER_DEVICE, BOILER_PROFILE, ENDPOINT};
use super::mocks::{MockConnector, MockHost, MockTransport};

// =============================================================================
// Device Builder
// =============================================================================

/// Builder for OPC UA devices with sensible defaults.
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    name: String,
    profile: String,
    admin_state: AdminState,
    operating_state: OperatingState,
    properties: ProtocolProperties,
}

impl Default for DeviceBuilder {
    fn default() -> Self {
        Self::new(BOILER_DEVICE)
    }
}

impl DeviceBuilder {
    /// Creates an unlocked, up device on the fixture endpoint with no security.
    pub fn new(name: impl Into<String>) -> Self {
        let mut properties = ProtocolProperties::new();
        properties.insert("Endpoint".to_string(), ENDPOINT.into());
        properties.insert("Policy".to_string(), "None".into());
        properties.insert("Mode".to_string(), "None".into());
        Self {
            name: name.into(),
            profile: BOILER_PROFILE.to_string(),
            admin_state: AdminState::Unlocked,
            operating_state: OperatingState::Up,
            properties,
        }
    }

    /// Sets the profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Locks the device.
    pub fn locked(mut self) -> Self {
        self.admin_state = AdminState::Locked;
        self
    }

    /// Marks the device down.
    pub fn down(mut self) -> Self {
        self.operating_state = OperatingState::Down;
        self
    }

    /// Sets any protocol property.
    pub fn property(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Sets the endpoint URL.
    pub fn endpoint(self, url: &str) -> Self {
        self.property("Endpoint", url)
    }

    /// Sets the subscribed resources as a comma-separated list.
    pub fn resources(self, resources: &[&str]) -> Self {
        self.property("Resources", resources.join(","))
    }

    /// Sets the security policy and mode.
    pub fn security(self, policy: &str, mode: &str) -> Self {
        self.property("Policy", policy).property("Mode", mode)
    }

    /// Builds the device.
    pub fn build(self) -> Device {
        Device::new(self.name)
            .with_profile(self.profile)
            .with_admin_state(self.admin_state)
            .with_operating_state(self.operating_state)
            .with_protocol("opcua", self.properties)
    }
}

// =============================================================================
// Driver Rig
// =============================================================================

/// A registry wired to a [`MockHost`] and a [`MockConnector`].
pub struct DriverRig {
    /// The host double.
    pub host: Arc<MockHost>,
    /// The connector double.
    pub connector: Arc<MockConnector>,
    /// The shared transport handed out by the connector.
    pub transport: Arc<MockTransport>,
    /// The registry under test.
    pub registry: Arc<DeviceRegistry>,
}

impl DriverRig {
    /// Creates a rig with the boiler profile and no devices.
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default().with_request_timeout(Duration::from_secs(2)))
    }

    /// Creates a rig with custom session settings.
    pub fn with_settings(settings: SessionSettings) -> Self {
        let host = Arc::new(MockHost::new());
        for resource in ResourceFixtures::boiler_profile() {
            host.add_resource(BOILER_PROFILE, resource);
        }

        let transport = MockTransport::new();
        let connector = MockConnector::new(Arc::clone(&transport));
        let registry = Arc::new(DeviceRegistry::new(
            Arc::clone(&host) as Arc<dyn edgeua_core::DeviceHost>,
            Arc::clone(&connector) as Arc<dyn edgeua_opcua::OpcUaConnector>,
            settings,
        ));

        Self {
            host,
            connector,
            transport,
            registry,
        }
    }

    /// Adds a resource to the boiler profile.
    pub fn add_resource(&self, resource: DeviceResource) {
        self.host.add_resource(BOILER_PROFILE, resource);
    }

    /// Registers a device with the host and the driver.
    pub async fn add_device(&self, device: Device) {
        self.host.put_device(device.clone());
        self.registry
            .add_device(&device)
            .await
            .expect("add_device should not fail");
    }

    /// Registers the default boiler device.
    pub async fn with_boiler(self) -> Self {
        self.add_device(DeviceBuilder::default().build()).await;
        self
    }
}

impl Default for DriverRig {
    fn default() -> Self {
        Self::new()
    }
}
