// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Standalone host backed by the configuration file.
//!
//! Without a device-management framework around it, the service answers the
//! driver's host queries from the loaded config and forwards asynchronous
//! readings into a bounded channel.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use edgeua_config::{ConfigResult, EdgeUaConfig};
use edgeua_core::{AsyncValues, Device, DeviceHost, DeviceResource, DriverError, DriverResult, Operation};

/// Default capacity of the readings channel.
pub const DEFAULT_READINGS_CAPACITY: usize = 1024;

// =============================================================================
// StaticHost
// =============================================================================

/// A [`DeviceHost`] over a fixed set of devices and profiles.
pub struct StaticHost {
    devices: RwLock<HashMap<String, Device>>,
    profiles: HashMap<String, Vec<DeviceResource>>,
    readings: mpsc::Sender<AsyncValues>,
}

impl StaticHost {
    /// Creates a host from explicit devices and profiles.
    ///
    /// Returns the host and the receiving end of its readings channel.
    pub fn new(
        devices: impl IntoIterator<Item = Device>,
        profiles: HashMap<String, Vec<DeviceResource>>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<AsyncValues>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let devices = devices.into_iter().map(|d| (d.name.clone(), d)).collect();
        let host = Self {
            devices: RwLock::new(devices),
            profiles,
            readings: tx,
        };
        (host, rx)
    }

    /// Builds a host from a validated configuration.
    pub fn from_config(
        config: &EdgeUaConfig,
        capacity: usize,
    ) -> ConfigResult<(Self, mpsc::Receiver<AsyncValues>)> {
        let mut profiles = HashMap::with_capacity(config.profiles.len());
        for profile in &config.profiles {
            profiles.insert(profile.name.clone(), profile.to_resources()?);
        }
        let devices = config.devices.iter().map(|d| d.to_device());
        Ok(Self::new(devices, profiles, capacity))
    }

    /// Inserts or replaces a device.
    pub fn upsert_device(&self, device: Device) {
        self.devices.write().insert(device.name.clone(), device);
    }

    /// Removes a device, returning it if it was known.
    pub fn remove_device(&self, name: &str) -> Option<Device> {
        self.devices.write().remove(name)
    }

    /// Returns the number of known devices.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }
}

impl std::fmt::Debug for StaticHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticHost")
            .field("devices", &self.device_count())
            .field("profiles", &self.profiles.len())
            .finish()
    }
}

#[async_trait]
impl DeviceHost for StaticHost {
    fn device_by_name(&self, name: &str) -> DriverResult<Device> {
        self.devices
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DriverError::not_found(name, Operation::Manage, format!("device {}", name)))
    }

    fn device_resource(&self, device: &str, resource: &str) -> Option<DeviceResource> {
        let profile = self.devices.read().get(device)?.profile_name.clone();
        self.profiles
            .get(&profile)?
            .iter()
            .find(|r| r.name == resource)
            .cloned()
    }

    fn devices(&self) -> Vec<Device> {
        self.devices.read().values().cloned().collect()
    }

    async fn send_readings(&self, values: AsyncValues) -> DriverResult<()> {
        let device = values.device_name.clone();
        self.readings
            .send(values)
            .await
            .map_err(|_| DriverError::connection(device, Operation::Subscribe, "readings channel closed"))
    }
}

// =============================================================================
// Readings Drain
// =============================================================================

/// Logs every reading until the channel closes or `shutdown` resolves.
///
/// Returns the number of readings drained.
pub async fn drain_readings(
    mut rx: mpsc::Receiver<AsyncValues>,
    shutdown: impl std::future::Future<Output = ()>,
) -> usize {
    tokio::pin!(shutdown);
    let mut count = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = rx.recv() => match next {
                Some(batch) => {
                    for value in &batch.values {
                        info!(
                            device = %batch.device_name,
                            resource = %value.resource_name,
                            value = %value.value,
                            "Reading"
                        );
                    }
                    count += batch.values.len();
                }
                None => break,
            },
        }
    }

    debug!(count, "Readings drain stopped");
    count
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use edgeua_core::{AdminState, CommandValue, Value, ValueType};

    fn host() -> (StaticHost, mpsc::Receiver<AsyncValues>) {
        let mut profiles = HashMap::new();
        profiles.insert(
            "boiler".to_string(),
            vec![DeviceResource::new("Temperature", ValueType::Float64)],
        );
        StaticHost::new([Device::new("boiler-1").with_profile("boiler")], profiles, 4)
    }

    #[test]
    fn test_device_lookup() {
        let (host, _rx) = host();
        assert_eq!(host.device_by_name("boiler-1").unwrap().name, "boiler-1");
        assert!(host.device_by_name("missing").is_err());
        assert!(host.device_resource("boiler-1", "Temperature").is_some());
        assert!(host.device_resource("boiler-1", "Pressure").is_none());
        assert!(host.device_resource("missing", "Temperature").is_none());
    }

    #[test]
    fn test_upsert_reflects_state() {
        let (host, _rx) = host();
        let locked = Device::new("boiler-1")
            .with_profile("boiler")
            .with_admin_state(AdminState::Locked);
        host.upsert_device(locked);
        assert_eq!(host.device_by_name("boiler-1").unwrap().admin_state, AdminState::Locked);
        assert_eq!(host.devices().len(), 1);
    }

    #[tokio::test]
    async fn test_readings_are_drained() {
        let (host, rx) = host();
        let values = AsyncValues {
            device_name: "boiler-1".to_string(),
            values: vec![CommandValue::new("Temperature", ValueType::Float64, Value::Float64(21.5))],
        };
        host.send_readings(values.clone()).await.unwrap();
        host.send_readings(values).await.unwrap();
        drop(host);

        assert_eq!(drain_readings(rx, std::future::pending()).await, 2);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (host, rx) = host();
        drop(rx);
        let result = host
            .send_readings(AsyncValues {
                device_name: "boiler-1".to_string(),
                values: vec![],
            })
            .await;
        assert!(result.is_err());
    }
}
