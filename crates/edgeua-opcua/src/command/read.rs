// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batched reads.
//!
//! A batch is planned first: each distinct node becomes one slot, and every
//! request pointing at the same node shares that slot. One read call fetches
//! all slots, then each slot's value is fanned out to its requests. Output
//! order always follows request order.

use std::collections::HashMap;
use std::time::Duration;

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::types::{CommandRequest, CommandValue};

use crate::client::transport::ReadResult;
use crate::client::{SessionManager, ValueCoercer};
use crate::types::{attributes, NodeId};

use super::resolve_node;

/// `MaxAge` sent with every read request.
pub const READ_MAX_AGE: Duration = Duration::from_millis(2000);

// =============================================================================
// ReadPlan
// =============================================================================

/// De-duplicated node list for a read batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPlan {
    /// Distinct nodes, in first-seen order.
    pub nodes: Vec<NodeId>,
    /// For each node, the indices of the requests that asked for it.
    pub slots: Vec<Vec<usize>>,
}

impl ReadPlan {
    /// Plans a batch.
    ///
    /// # Errors
    ///
    /// - `Protocol` if a request targets a method resource
    /// - `NotFound` / `Parse` if a node identifier cannot be resolved
    pub fn build(device: &str, requests: &[CommandRequest]) -> DriverResult<Self> {
        let mut nodes = Vec::new();
        let mut slots: Vec<Vec<usize>> = Vec::new();
        let mut index_of: HashMap<NodeId, usize> = HashMap::new();

        for (i, request) in requests.iter().enumerate() {
            if request.has_attribute(attributes::METHOD_ID) {
                return Err(DriverError::protocol(
                    device,
                    Operation::Read,
                    format!("not allowed to call command on method: {}", request.resource_name),
                ));
            }

            let node = resolve_node(device, Operation::Read, &request.attributes, attributes::NODE_ID)?;
            match index_of.get(&node) {
                Some(&slot) => slots[slot].push(i),
                None => {
                    index_of.insert(node.clone(), nodes.len());
                    nodes.push(node);
                    slots.push(vec![i]);
                }
            }
        }

        Ok(Self { nodes, slots })
    }

    /// Number of distinct nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` for an empty batch.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Maps per-slot results back onto request positions.
    ///
    /// Slots with a non-good status leave their positions empty.
    pub fn fan_out(
        &self,
        device: &str,
        requests: &[CommandRequest],
        results: &[ReadResult],
    ) -> DriverResult<Vec<Option<CommandValue>>> {
        if results.len() != self.nodes.len() {
            return Err(DriverError::protocol(
                device,
                Operation::Read,
                format!("read returned {} results for {} nodes", results.len(), self.nodes.len()),
            ));
        }

        let mut values = vec![None; requests.len()];
        for ((node, indices), result) in self.nodes.iter().zip(&self.slots).zip(results) {
            let value = match (&result.value, result.is_good()) {
                (Some(value), true) => value,
                _ => {
                    tracing::debug!(device, node = %node, status = result.status_code, "Read slot returned no value");
                    continue;
                }
            };

            for &i in indices {
                let request = &requests[i];
                let mut reading = ValueCoercer::to_command_value(&request.resource_name, request.value_type, value)
                    .map_err(|e| e.into_driver_error(device, Operation::Read, &request.resource_name))?;
                if let Some(ts) = result.source_timestamp {
                    reading = reading.with_origin(ts);
                }
                values[i] = Some(reading);
            }
        }
        Ok(values)
    }
}

// =============================================================================
// SessionManager
// =============================================================================

impl SessionManager {
    /// Reads a batch of resources.
    ///
    /// The returned vector has one entry per request. A failure of the read
    /// call itself fails the whole batch.
    pub async fn process_read_commands(&self, requests: &[CommandRequest]) -> DriverResult<Vec<Option<CommandValue>>> {
        let device = self.device_name();
        self.gate(Operation::Read)?;

        let plan = ReadPlan::build(device, requests)?;
        if plan.is_empty() {
            return Ok(Vec::new());
        }

        let transport = self.ensure_connected(Operation::Read).await?;
        let results = self
            .timed(Operation::Read, transport.read_values(&plan.nodes, READ_MAX_AGE))
            .await
            .map_err(|e| {
                tracing::error!(device, error = %e, "Handle read commands failed");
                e
            })?;

        let values = plan.fan_out(device, requests, &results)?;
        tracing::info!(
            device,
            requested = requests.len(),
            nodes = plan.len(),
            returned = values.iter().filter(|v| v.is_some()).count(),
            "Read command finished"
        );
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{status, OpcUaValue};
    use edgeua_core::types::{Value, ValueType};

    fn request(name: &str, node: &str) -> CommandRequest {
        CommandRequest::new(name, ValueType::Int32).with_attribute(attributes::NODE_ID, node)
    }

    #[test]
    fn test_plan_deduplicates_nodes() {
        let requests = vec![
            request("A", "ns=2;s=x"),
            request("B", "ns=2;s=y"),
            request("C", "ns=2;s=x"),
        ];
        let plan = ReadPlan::build("dev", &requests).unwrap();
        assert_eq!(plan.nodes, vec![NodeId::string(2, "x"), NodeId::string(2, "y")]);
        assert_eq!(plan.slots, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_plan_rejects_method_resources() {
        let requests = vec![request("A", "ns=2;s=x").with_attribute(attributes::METHOD_ID, "ns=2;s=m")];
        let err = ReadPlan::build("dev", &requests).unwrap_err();
        assert_eq!(err.error_type(), "protocol");
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let requests = vec![request("A", "ns=2;s=x"), request("B", "ns=2;s=x")];
        let plan = ReadPlan::build("dev", &requests).unwrap();
        let values = plan
            .fan_out("dev", &requests, &[ReadResult::good(OpcUaValue::Int32(5))])
            .unwrap();

        let names: Vec<_> = values.iter().flatten().map(|v| v.resource_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(values.iter().flatten().all(|v| v.value == Value::Int32(5)));
    }

    #[test]
    fn test_fan_out_bad_status_leaves_gaps() {
        let requests = vec![request("A", "ns=2;s=x"), request("B", "ns=2;s=y")];
        let plan = ReadPlan::build("dev", &requests).unwrap();
        let values = plan
            .fan_out(
                "dev",
                &requests,
                &[ReadResult::bad(status::BAD_NODE_ID_UNKNOWN), ReadResult::good(OpcUaValue::Int32(1))],
            )
            .unwrap();
        assert!(values[0].is_none());
        assert_eq!(values[1].as_ref().map(|v| v.value.clone()), Some(Value::Int32(1)));
    }

    #[test]
    fn test_fan_out_rejects_short_response() {
        let requests = vec![request("A", "ns=2;s=x")];
        let plan = ReadPlan::build("dev", &requests).unwrap();
        assert!(plan.fan_out("dev", &requests, &[]).is_err());
    }
}
