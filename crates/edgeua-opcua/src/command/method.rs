// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Method invocation.
//!
//! A method is a device resource carrying `objectId` and `methodId`
//! attributes. Parameters arrive as strings and are sent as string arguments;
//! the server is expected to convert them. An optional `inputMap` attribute
//! lists the declared argument names and is only used for logging.

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::types::{lookup, Value};

use crate::client::transport::status;
use crate::client::{SessionManager, ValueCoercer};
use crate::error::TransportError;
use crate::types::attributes;

use super::resolve_node;

impl SessionManager {
    /// Calls the method declared by resource `method` and returns its first
    /// output argument.
    ///
    /// # Errors
    ///
    /// - `DeviceState` if the device is locked or down
    /// - `NotFound` if the resource or one of its node attributes is missing
    /// - `NotAllowed` if the resource is hidden
    /// - `Protocol` if the call status is not good or the call returned no output
    pub async fn process_method_call(&self, method: &str, parameters: &[String]) -> DriverResult<Value> {
        let device = self.device_name();
        let operation = Operation::Call;
        self.gate(operation)?;

        let resource = self
            .host()
            .device_resource(device, method)
            .ok_or_else(|| DriverError::not_found(device, operation, format!("method {}", method)))?;
        if resource.is_hidden {
            return Err(DriverError::not_allowed(device, operation, format!("method '{}'", method)));
        }

        let object = resolve_node(device, operation, &resource.attributes, attributes::OBJECT_ID)?;
        let method_node = resolve_node(device, operation, &resource.attributes, attributes::METHOD_ID)?;
        if let Some(inputs) = lookup(&resource.attributes, attributes::INPUT_MAP) {
            tracing::debug!(device, method, inputs = %inputs, supplied = parameters.len(), "Method inputs");
        }
        let arguments = parameters.iter().map(|p| ValueCoercer::string_argument(p)).collect();

        let transport = self.ensure_connected(operation).await?;
        let result = self
            .timed(operation, transport.call_method(&object, &method_node, arguments))
            .await?;
        if !status::is_good(result.status_code) {
            return Err(TransportError::bad_status("call", result.status_code).into_driver_error(device, operation));
        }

        let output = result
            .outputs
            .first()
            .ok_or_else(|| DriverError::protocol(device, operation, format!("method {} returned no output", method)))?;
        tracing::info!(device, method, output = %output, "Method call succeeded");
        Ok(ValueCoercer::to_core_value(output))
    }
}
