// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command translation.
//!
//! Turns host command requests into OPC UA service calls:
//!
//! - [`read`]: batched, de-duplicated reads
//! - [`write`]: sequential, fail-fast writes
//! - [`method`]: method invocation

pub mod method;
pub mod read;
pub mod write;

use edgeua_core::error::{DriverError, DriverResult, Operation};
use edgeua_core::types::{lookup, Attributes};

use crate::types::NodeId;

pub use read::ReadPlan;

/// Resolves a node identifier attribute of a resource.
///
/// A missing attribute is a not-found error; a non-string or malformed value
/// is a parse error.
pub fn resolve_node(device: &str, operation: Operation, attributes: &Attributes, key: &str) -> DriverResult<NodeId> {
    let raw = lookup(attributes, key)
        .ok_or_else(|| DriverError::not_found(device, operation, format!("attribute {}", key)))?;
    let text = raw.as_str().ok_or_else(|| {
        DriverError::parse(device, operation, raw.to_string(), format!("attribute {} is not a string", key))
    })?;
    text.parse::<NodeId>()
        .map_err(|e| e.into_driver_error(device, operation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: serde_json::Value) -> Attributes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_node() {
        let node = resolve_node("d", Operation::Read, &attrs(json!({"nodeId": "ns=2;i=7"})), "nodeId").unwrap();
        assert_eq!(node, NodeId::numeric(2, 7));
    }

    #[test]
    fn test_resolve_node_errors() {
        let missing = resolve_node("d", Operation::Read, &attrs(json!({})), "nodeId").unwrap_err();
        assert_eq!(missing.error_type(), "not_found");
        assert!(missing.to_string().contains("attribute nodeId"));

        let not_string = resolve_node("d", Operation::Read, &attrs(json!({"nodeId": 7})), "nodeId").unwrap_err();
        assert_eq!(not_string.error_type(), "parse");

        let malformed = resolve_node("d", Operation::Call, &attrs(json!({"objectId": "ns=;i=1"})), "objectId").unwrap_err();
        assert_eq!(malformed.error_type(), "parse");
        assert_eq!(malformed.operation(), Operation::Call);
    }
}
