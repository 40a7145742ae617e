// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol driver abstraction layer.
//!
//! The host calls into a driver through [`ProtocolDriver`]. Drivers that can
//! invoke server-side methods additionally implement [`MethodInvoker`], which
//! the REST surface depends on.
//!
//! # Lifecycle
//!
//! 1. `initialize()` seeds per-device state from the host
//! 2. `add_device()` / `update_device()` / `remove_device()` track changes
//! 3. `handle_read_commands()` / `handle_write_commands()` serve the host
//! 4. `stop()` tears everything down

use async_trait::async_trait;

use crate::error::{DriverError, DriverResult, Operation};
use crate::types::{CommandRequest, CommandValue, Device, Value};

// =============================================================================
// ProtocolDriver Trait
// =============================================================================

/// The interface the host framework drives.
///
/// All methods take `&self`; implementations synchronize internally so the
/// host may issue commands for different devices concurrently.
#[async_trait]
pub trait ProtocolDriver: Send + Sync {
    /// Returns the driver name used in logs.
    fn name(&self) -> &str;

    /// Creates per-device state for every device the host already knows.
    async fn initialize(&self) -> DriverResult<()>;

    /// Starts tracking a newly added device.
    async fn add_device(&self, device: &Device) -> DriverResult<()>;

    /// Applies a configuration change to a tracked device.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotFound` if the device is not tracked.
    async fn update_device(&self, device: &Device) -> DriverResult<()>;

    /// Stops tracking a device and releases its connection.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotFound` if the device is not tracked.
    async fn remove_device(&self, name: &str) -> DriverResult<()>;

    /// Checks that a device's protocol properties are usable.
    fn validate_device(&self, device: &Device) -> DriverResult<()>;

    /// Discovers devices on the network.
    async fn discover(&self) -> DriverResult<Vec<Device>> {
        Err(DriverError::not_supported(Operation::Discover))
    }

    /// Releases every device. `force` skips waiting on in-flight work.
    async fn stop(&self, force: bool) -> DriverResult<()>;

    /// Reads a batch of resources.
    ///
    /// The output has the same length and order as `requests`. A position is
    /// `None` when the server returned no value for it.
    async fn handle_read_commands(
        &self,
        device: &str,
        requests: &[CommandRequest],
    ) -> DriverResult<Vec<Option<CommandValue>>>;

    /// Writes a batch of values, one per request.
    async fn handle_write_commands(
        &self,
        device: &str,
        requests: &[CommandRequest],
        values: &[CommandValue],
    ) -> DriverResult<()>;
}

// =============================================================================
// MethodInvoker Trait
// =============================================================================

/// Invokes a server-side method declared as a device resource.
#[async_trait]
pub trait MethodInvoker: Send + Sync {
    /// Calls `method` on `device` with string parameters and returns the
    /// first output argument.
    async fn call_method(&self, device: &str, method: &str, parameters: &[String]) -> DriverResult<Value>;
}
