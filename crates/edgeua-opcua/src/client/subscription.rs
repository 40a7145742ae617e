// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription listener.
//!
//! Each device runs at most one listener. It opens a subscription, registers
//! one monitored item per configured resource and forwards every data change
//! to the host as an asynchronous reading.
//!
//! Monitored items are keyed by client handle `CLIENT_HANDLE_BASE + index`,
//! where `index` is the position of the resource in the configured list.
//! Unresolvable resources still consume their index, so handles never shift
//! when a profile is missing an entry.

use std::sync::Arc;
use std::time::Duration;

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::types::AsyncValues;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::conversion::ValueCoercer;
use crate::client::session::SessionManager;
use crate::client::transport::{status, DataChangeNotification, OpcUaTransport};
use crate::command::resolve_node;
use crate::error::TransportError;
use crate::types::attributes;

/// Publishing interval of the change subscription.
pub const SUBSCRIPTION_INTERVAL: Duration = Duration::from_millis(500);

/// Client handle of the first configured resource.
pub const CLIENT_HANDLE_BASE: u32 = 42;

impl SessionManager {
    /// Runs the subscription listener until `cancel` fires.
    ///
    /// Returns `Ok(())` without touching the network when the device is
    /// locked or down. Setup failures end the listener with an error; errors
    /// on individual notifications are logged and skipped.
    pub async fn start_subscription_listener(&self, cancel: CancellationToken) -> DriverResult<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(()),
            result = self.listen(&cancel) => result,
        }
    }

    async fn listen(&self, cancel: &CancellationToken) -> DriverResult<()> {
        let operation = Operation::Subscribe;
        let transport = match self.ensure_connected(operation).await {
            Ok(transport) => transport,
            Err(DriverError::DeviceState { .. }) => {
                tracing::debug!(device = %self.device_name(), "Device locked or down, subscription skipped");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscription_id = self
            .timed(operation, transport.create_subscription(SUBSCRIPTION_INTERVAL, tx))
            .await?;
        self.configure_monitored_items(&transport, subscription_id).await?;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                notification = rx.recv() => match notification {
                    Some(notification) => self.handle_data_change(notification).await,
                    None => {
                        tracing::debug!(device = %self.device_name(), "Notification channel closed");
                        return Ok(());
                    }
                },
            }
        }
    }

    async fn configure_monitored_items(
        &self,
        transport: &Arc<dyn OpcUaTransport>,
        subscription_id: u32,
    ) -> DriverResult<()> {
        let operation = Operation::Subscribe;
        let device = self.device_name();
        let resources = self.reset_resource_map().await;

        for (index, resource) in resources.iter().enumerate() {
            let handle = CLIENT_HANDLE_BASE + index as u32;
            let Some(descriptor) = self.host().device_resource(device, resource) else {
                tracing::warn!(device, resource = %resource, handle, "Unable to find resource, not monitored");
                continue;
            };

            let node = resolve_node(device, operation, &descriptor.attributes, attributes::NODE_ID)?;
            let status_code = self
                .timed(operation, transport.create_monitored_item(subscription_id, &node, handle))
                .await?;
            if !status::is_good(status_code) {
                return Err(TransportError::bad_status("monitor", status_code).into_driver_error(device, operation));
            }

            self.record_handle(handle, resource).await;
            tracing::info!(device, resource = %resource, handle, "Start incoming data listening");
        }
        Ok(())
    }

    async fn handle_data_change(&self, notification: DataChangeNotification) {
        let device = self.device_name();
        let handles: Vec<u32> = notification.items.iter().map(|i| i.client_handle).collect();
        let names = self.lookup_handles(&handles).await;

        for (item, name) in notification.items.into_iter().zip(names) {
            let Some(value) = item.value.filter(|v| !v.is_null()) else {
                continue;
            };
            let Some(name) = name else {
                tracing::debug!(device, handle = item.client_handle, "Notification for unknown handle ignored");
                continue;
            };
            let Some(descriptor) = self.host().device_resource(device, &name) else {
                tracing::warn!(device, resource = %name, value = %value, "Incoming reading ignored, no device resource");
                continue;
            };

            let reading = match ValueCoercer::to_command_value(&name, descriptor.value_type, &value) {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(device, resource = %name, value = %value, error = %e, "Incoming reading ignored");
                    continue;
                }
            };

            tracing::info!(device, resource = %name, value = %value, "Incoming reading received");
            let batch = AsyncValues {
                device_name: device.to_string(),
                values: vec![reading],
            };
            if let Err(e) = self.host().send_readings(batch).await {
                tracing::error!(device, resource = %name, error = %e, "Failed to forward reading");
            }
        }
    }
}

