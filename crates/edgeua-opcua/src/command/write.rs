// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Sequential writes.

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::types::{CommandRequest, CommandValue};

use crate::client::transport::status;
use crate::client::{SessionManager, ValueCoercer};
use crate::error::TransportError;
use crate::types::attributes;

use super::resolve_node;

impl SessionManager {
    /// Writes a batch of values, one per request, in order.
    ///
    /// The first failure stops the batch. Writes already applied are not
    /// rolled back.
    pub async fn process_write_commands(&self, requests: &[CommandRequest], values: &[CommandValue]) -> DriverResult<()> {
        self.gate(Operation::Write)?;

        for (i, request) in requests.iter().enumerate() {
            let value = values.get(i).ok_or_else(|| {
                DriverError::not_found(
                    self.device_name(),
                    Operation::Write,
                    format!("value for resource {}", request.resource_name),
                )
            })?;

            if let Err(e) = self.write_one(request, value).await {
                tracing::error!(
                    device = %self.device_name(),
                    resource = %request.resource_name,
                    error = %e,
                    "Handle write commands failed"
                );
                return Err(e);
            }
        }
        Ok(())
    }

    async fn write_one(&self, request: &CommandRequest, value: &CommandValue) -> DriverResult<()> {
        let device = self.device_name();
        let node = resolve_node(device, Operation::Write, &request.attributes, attributes::NODE_ID)?;
        let wire = ValueCoercer::encode(request.value_type, &value.value)
            .map_err(|e| e.into_driver_error(device, Operation::Write, &request.resource_name))?;

        let transport = self.ensure_connected(Operation::Write).await?;
        let status_code = self
            .timed(Operation::Write, transport.write_value(&node, wire.clone()))
            .await?;
        if !status::is_good(status_code) {
            return Err(TransportError::bad_status("write", status_code).into_driver_error(device, Operation::Write));
        }

        tracing::info!(device, resource = %request.resource_name, node = %node, value = %wire, "Write succeeded");
        Ok(())
    }
}
