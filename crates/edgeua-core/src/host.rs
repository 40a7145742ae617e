// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Host framework services consumed by drivers.

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::types::{AsyncValues, Device, DeviceResource};

/// Services the host device framework provides to a driver.
///
/// Implementations must be cheap to call concurrently; drivers query the
/// host on every command to pick up the current device state.
#[async_trait]
pub trait DeviceHost: Send + Sync {
    /// Looks up a device by name.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotFound` if the device is unknown.
    fn device_by_name(&self, name: &str) -> DriverResult<Device>;

    /// Looks up a resource in the profile of a device.
    fn device_resource(&self, device: &str, resource: &str) -> Option<DeviceResource>;

    /// Returns all devices currently known to the host.
    fn devices(&self) -> Vec<Device>;

    /// Pushes asynchronous readings to the host.
    async fn send_readings(&self, values: AsyncValues) -> DriverResult<()>;
}
