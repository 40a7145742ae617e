// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device registry.
//!
//! The [`DeviceRegistry`] is the entry point the host drives. It maps device
//! names to [`SessionManager`]s and implements [`ProtocolDriver`] and
//! [`MethodInvoker`] by dispatching to the right session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        DeviceRegistry                           │
//! │            (ProtocolDriver + MethodInvoker impl)                │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │  one per device
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       SessionManager                            │
//! │      (connection, read/write/call, subscription listener)       │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               OpcUaConnector / OpcUaTransport                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map lock is synchronous and only held to look up, insert or remove an
//! `Arc<SessionManager>`; it is never held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use edgeua_core::driver::{MethodInvoker, ProtocolDriver};
use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::host::DeviceHost;
use edgeua_core::types::{CommandRequest, CommandValue, Device, Value};
use parking_lot::Mutex;

use crate::client::{OpcUaConnector, SessionManager, SessionSettings};
use crate::types::OpcUaConfig;

/// Driver name reported to the host.
pub const DRIVER_NAME: &str = "opcua";

// =============================================================================
// DeviceRegistry
// =============================================================================

/// Concurrency-safe map from device name to session.
pub struct DeviceRegistry {
    host: Arc<dyn DeviceHost>,
    connector: Arc<dyn OpcUaConnector>,
    settings: SessionSettings,
    sessions: Mutex<HashMap<String, Arc<SessionManager>>>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    pub fn new(host: Arc<dyn DeviceHost>, connector: Arc<dyn OpcUaConnector>, settings: SessionSettings) -> Self {
        Self {
            host,
            connector,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session of a device, if tracked.
    pub fn session(&self, name: &str) -> Option<Arc<SessionManager>> {
        self.sessions.lock().get(name).cloned()
    }

    /// Returns the tracked device names, sorted.
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of tracked devices.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Returns `true` if no device is tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn lookup(&self, name: &str, operation: Operation) -> DriverResult<Arc<SessionManager>> {
        self.session(name)
            .ok_or_else(|| DriverError::not_found(name, operation, format!("device {}", name)))
    }

    fn new_session(&self, name: &str) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            name,
            Arc::clone(&self.host),
            Arc::clone(&self.connector),
            self.settings,
        ))
    }
}

// =============================================================================
// ProtocolDriver
// =============================================================================

#[async_trait]
impl ProtocolDriver for DeviceRegistry {
    fn name(&self) -> &str {
        DRIVER_NAME
    }

    async fn initialize(&self) -> DriverResult<()> {
        let devices = self.host.devices();
        tracing::info!(count = devices.len(), "Initializing OPC UA driver");
        for device in &devices {
            if let Err(e) = self.add_device(device).await {
                tracing::warn!(device = %device.name, error = %e, "Failed to add device");
            }
        }
        Ok(())
    }

    async fn add_device(&self, device: &Device) -> DriverResult<()> {
        let session = self.new_session(&device.name);
        let previous = self
            .sessions
            .lock()
            .insert(device.name.clone(), Arc::clone(&session));
        if let Some(previous) = previous {
            tracing::debug!(device = %device.name, "Replacing existing session");
            previous.cleanup(false).await;
        }

        session.spawn_listener().await;
        tracing::debug!(device = %device.name, "Device added");
        Ok(())
    }

    async fn update_device(&self, device: &Device) -> DriverResult<()> {
        let session = self.lookup(&device.name, Operation::Manage)?;
        session.cleanup(true).await;
        session.spawn_listener().await;
        tracing::debug!(device = %device.name, "Device updated");
        Ok(())
    }

    async fn remove_device(&self, name: &str) -> DriverResult<()> {
        let session = self
            .sessions
            .lock()
            .remove(name)
            .ok_or_else(|| DriverError::not_found(name, Operation::Manage, format!("device {}", name)))?;
        session.cleanup(false).await;
        tracing::debug!(device = %name, "Device removed");
        Ok(())
    }

    fn validate_device(&self, device: &Device) -> DriverResult<()> {
        OpcUaConfig::from_device(device)
            .map(|_| ())
            .map_err(|e| e.into_driver_error(&device.name, Operation::Validate))
    }

    async fn stop(&self, force: bool) -> DriverResult<()> {
        let sessions: Vec<Arc<SessionManager>> = self.sessions.lock().drain().map(|(_, s)| s).collect();
        tracing::info!(count = sessions.len(), force, "Stopping OPC UA driver");
        for session in sessions {
            session.shutdown(force).await;
        }
        Ok(())
    }

    async fn handle_read_commands(
        &self,
        device: &str,
        requests: &[CommandRequest],
    ) -> DriverResult<Vec<Option<CommandValue>>> {
        self.lookup(device, Operation::Read)?
            .process_read_commands(requests)
            .await
    }

    async fn handle_write_commands(
        &self,
        device: &str,
        requests: &[CommandRequest],
        values: &[CommandValue],
    ) -> DriverResult<()> {
        self.lookup(device, Operation::Write)?
            .process_write_commands(requests, values)
            .await
    }
}

// =============================================================================
// MethodInvoker
// =============================================================================

#[async_trait]
impl MethodInvoker for DeviceRegistry {
    async fn call_method(&self, device: &str, method: &str, parameters: &[String]) -> DriverResult<Value> {
        self.lookup(device, Operation::Call)?
            .process_method_call(method, parameters)
            .await
    }
}

impl std::fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.device_names())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
