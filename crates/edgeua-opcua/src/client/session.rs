// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-device OPC UA session management.
//!
//! A [`SessionManager`] owns everything one device needs at runtime: the open
//! transport, the validated configuration snapshot, the subscription handle
//! map, and the lifecycle token and join handle of its listener task.
//!
//! The transport, configuration and handle map live behind a single async
//! mutex. Connection checks, connects, reconnects and map updates all go
//! through it, so two callers never race to connect and nobody uses a
//! transport that another task is closing. The lifecycle token sits in its
//! own short-lived lock so cleanup can cancel the listener without waiting.
//! Each listener also runs under a child token stored with its join handle,
//! so cleanup stops whichever listener it takes out of the session, even one
//! spawned after the lifecycle token was swapped.
//!
//! # Lifecycle
//!
//! ```text
//!  Disconnected ──connect──► Connected ──cleanup──► Disconnected
//!        ▲                      │
//!        └──── transport closed ┘   (next command reconnects)
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::host::DeviceHost;
use edgeua_core::types::Device;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::types::OpcUaConfig;

use super::endpoint::select_endpoint;
use super::transport::{ConnectionSettings, OpcUaConnector, OpcUaTransport};

/// Default bound on a single network round-trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// SessionSettings
// =============================================================================

/// Tunables shared by every session of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Upper bound for discovery, open, read, write, call, subscribe and
    /// monitor round-trips. Zero disables the bound.
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SessionSettings {
    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// SessionManager
// =============================================================================

/// Mutable per-device state, guarded by the session mutex.
#[derive(Default)]
struct SessionInner {
    transport: Option<Arc<dyn OpcUaTransport>>,
    config: Option<OpcUaConfig>,
    resource_map: HashMap<u32, String>,
    listener: Option<ListenerTask>,
}

/// A running listener and the token that stops it.
struct ListenerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ListenerTask {
    fn stop(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Connection owner and command executor for one device.
pub struct SessionManager {
    device_name: String,
    host: Arc<dyn DeviceHost>,
    connector: Arc<dyn OpcUaConnector>,
    settings: SessionSettings,
    inner: Mutex<SessionInner>,
    lifecycle: parking_lot::Mutex<Option<CancellationToken>>,
}

impl SessionManager {
    /// Creates a disconnected session with a fresh lifecycle token.
    pub fn new(
        device_name: impl Into<String>,
        host: Arc<dyn DeviceHost>,
        connector: Arc<dyn OpcUaConnector>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            host,
            connector,
            settings,
            inner: Mutex::new(SessionInner::default()),
            lifecycle: parking_lot::Mutex::new(Some(CancellationToken::new())),
        }
    }

    /// Returns the device name.
    #[inline]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Returns the session settings.
    #[inline]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub(crate) fn host(&self) -> &Arc<dyn DeviceHost> {
        &self.host
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns `true` if a transport is held and usable.
    pub async fn is_connected(&self) -> bool {
        let inner = self.inner.lock().await;
        inner
            .transport
            .as_ref()
            .is_some_and(|t| !t.state().needs_reconnect())
    }

    /// Returns a snapshot of the subscription handle map.
    pub async fn resource_map(&self) -> HashMap<u32, String> {
        self.inner.lock().await.resource_map.clone()
    }

    /// Returns `true` while a listener task is running.
    pub async fn is_listening(&self) -> bool {
        let inner = self.inner.lock().await;
        inner.listener.as_ref().is_some_and(|l| !l.handle.is_finished())
    }

    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Fetches the device and rejects it when locked or down.
    pub(crate) fn gate(&self, operation: Operation) -> DriverResult<Device> {
        let device = self.host.device_by_name(&self.device_name)?;
        if device.is_locked_or_down() {
            return Err(DriverError::device_state(
                &self.device_name,
                operation,
                device.admin_state,
                device.operating_state,
            ));
        }
        Ok(device)
    }

    /// Establishes a new connection, replacing any existing one.
    ///
    /// # Errors
    ///
    /// - `DeviceState` if the device is locked or down
    /// - `Config` if the protocol properties are invalid
    /// - `Connection` if discovery, endpoint selection or open fails
    pub async fn connect(&self) -> DriverResult<()> {
        let device = self.gate(Operation::Connect)?;
        let mut inner = self.inner.lock().await;
        self.connect_locked(&mut inner, &device, Operation::Connect).await?;
        Ok(())
    }

    /// Returns a live transport, reconnecting first when needed.
    ///
    /// A failed reconnect is reported as a connection error whose source is
    /// the underlying failure.
    pub(crate) async fn ensure_connected(&self, operation: Operation) -> DriverResult<Arc<dyn OpcUaTransport>> {
        let device = self.gate(operation)?;
        let mut inner = self.inner.lock().await;

        if let Some(transport) = inner.transport.as_ref() {
            if !transport.state().needs_reconnect() {
                return Ok(Arc::clone(transport));
            }
            tracing::debug!(
                device = %self.device_name,
                state = %transport.state(),
                "Transport not usable, reconnecting"
            );
        }

        self.connect_locked(&mut inner, &device, operation)
            .await
            .map_err(|cause| {
                DriverError::connection_with(&self.device_name, operation, "client not initialized", cause)
            })
    }

    async fn connect_locked(
        &self,
        inner: &mut SessionInner,
        device: &Device,
        operation: Operation,
    ) -> DriverResult<Arc<dyn OpcUaTransport>> {
        if let Some(previous) = inner.transport.take() {
            if let Err(e) = previous.close().await {
                tracing::warn!(device = %self.device_name, error = %e, "Failed to close previous OPC UA connection");
            }
        }

        let config = OpcUaConfig::from_device(device)
            .map_err(|e| e.into_driver_error(&self.device_name, operation))?;
        inner.config = Some(config.clone());

        let endpoints = self
            .timed(operation, self.connector.discover_endpoints(&config.endpoint))
            .await?;
        let endpoint = select_endpoint(&endpoints, &config).map_err(|e| {
            tracing::error!(device = %self.device_name, error = %e, "Endpoint selection failed");
            e.into_driver_error(&self.device_name, operation)
        })?;

        let settings = ConnectionSettings {
            device_name: self.device_name.clone(),
            config,
        };
        let transport = self
            .timed(operation, self.connector.open(&endpoint, &settings))
            .await
            .map_err(|e| {
                tracing::warn!(device = %self.device_name, error = %e, "Failed to connect OPC UA client");
                e
            })?;

        tracing::info!(
            device = %self.device_name,
            endpoint = %endpoint.endpoint_url,
            policy = %settings.config.policy,
            mode = %settings.config.mode,
            "OPC UA client connected"
        );
        inner.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Awaits a transport round-trip under the request timeout.
    pub(crate) async fn timed<T, F>(&self, operation: Operation, future: F) -> DriverResult<T>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        let timeout = self.settings.request_timeout;
        let result = if timeout.is_zero() {
            future.await
        } else {
            tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| DriverError::timeout(&self.device_name, operation, timeout))?
        };
        result.map_err(|e| e.into_driver_error(&self.device_name, operation))
    }

    // =========================================================================
    // Resource Map
    // =========================================================================

    /// Returns the configured subscription resources and clears the map.
    pub(crate) async fn reset_resource_map(&self) -> Vec<String> {
        let mut inner = self.inner.lock().await;
        inner.resource_map.clear();
        inner
            .config
            .as_ref()
            .map(|c| c.resources.clone())
            .unwrap_or_default()
    }

    pub(crate) async fn record_handle(&self, handle: u32, resource: &str) {
        self.inner
            .lock()
            .await
            .resource_map
            .insert(handle, resource.to_string());
    }

    /// Resolves several handles under one lock.
    pub(crate) async fn lookup_handles(&self, handles: &[u32]) -> Vec<Option<String>> {
        let inner = self.inner.lock().await;
        handles
            .iter()
            .map(|h| inner.resource_map.get(h).cloned())
            .collect()
    }

    // =========================================================================
    // Listener Task
    // =========================================================================

    /// Spawns the subscription listener under the current lifecycle token.
    ///
    /// Does nothing once the session has been cleaned up without recreating
    /// its token. A listener already running is stopped first. Listener
    /// failures are logged by the task itself.
    pub async fn spawn_listener(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        let Some(cancel) = self.lifecycle.lock().as_ref().map(CancellationToken::child_token) else {
            tracing::debug!(device = %self.device_name, "Session released, listener not started");
            return;
        };
        if let Some(previous) = inner.listener.take() {
            previous.stop();
        }

        let session = Arc::clone(self);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = session.start_subscription_listener(token).await {
                tracing::error!(
                    device = %session.device_name,
                    error = %e,
                    "Subscription listener stopped"
                );
            }
        });
        inner.listener = Some(ListenerTask { cancel, handle });
    }

    // =========================================================================
    // Cleanup
    // =========================================================================

    /// Releases the connection and stops the listener.
    ///
    /// The listener is cancelled and awaited before the transport is closed.
    /// With `recreate_context` a fresh lifecycle token is installed so the
    /// session can be reused. Close failures are logged, never returned.
    pub async fn cleanup(&self, recreate_context: bool) {
        self.release(recreate_context, false).await;
    }

    /// Like [`cleanup`](Self::cleanup) without recreating the token; with
    /// `force` the listener is aborted instead of awaited.
    pub async fn shutdown(&self, force: bool) {
        self.release(false, force).await;
    }

    async fn release(&self, recreate_context: bool, force: bool) {
        // Cancel before taking the session lock so a listener blocked inside a
        // connect gives the lock up.
        let cancel = {
            let mut lifecycle = self.lifecycle.lock();
            let current = lifecycle.take();
            if recreate_context {
                *lifecycle = Some(CancellationToken::new());
            }
            current
        };
        if let Some(cancel) = cancel {
            cancel.cancel();
        }

        // A listener spawned while we waited for the lock runs under the new
        // token, so cancel the one we take out explicitly.
        let (transport, listener) = {
            let mut inner = self.inner.lock().await;
            inner.resource_map.clear();
            let listener = inner.listener.take();
            if let Some(listener) = listener.as_ref() {
                listener.cancel.cancel();
            }
            (inner.transport.take(), listener)
        };

        if let Some(ListenerTask { handle, .. }) = listener {
            if force {
                handle.abort();
            } else if let Err(e) = handle.await {
                tracing::warn!(device = %self.device_name, error = %e, "Subscription listener ended abnormally");
            }
        }

        if let Some(transport) = transport {
            if let Err(e) = transport.close().await {
                tracing::warn!(device = %self.device_name, error = %e, "Failed to close OPC UA client");
            }
        }
        tracing::debug!(device = %self.device_name, recreate_context, "Session cleaned up");
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("device_name", &self.device_name)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SessionSettings::default();
        assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        let disabled = settings.with_request_timeout(Duration::ZERO);
        assert!(disabled.request_timeout.is_zero());
    }
}
