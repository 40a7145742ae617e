// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Connector used when no wire transport is compiled in.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;

use super::transport::{ConnectionSettings, EndpointDescription, OpcUaConnector, OpcUaTransport, TransportResult};

/// Connector that fails every discovery.
///
/// Commands against devices then surface as connection errors while the rest
/// of the service (configuration, HTTP surface, device tracking) keeps working.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableConnector;

const MESSAGE: &str = "built without the real-transport feature";

#[async_trait]
impl OpcUaConnector for UnavailableConnector {
    async fn discover_endpoints(&self, _url: &str) -> TransportResult<Vec<EndpointDescription>> {
        Err(TransportError::Unavailable {
            message: MESSAGE.to_string(),
        })
    }

    async fn open(
        &self,
        _endpoint: &EndpointDescription,
        _settings: &ConnectionSettings,
    ) -> TransportResult<Arc<dyn OpcUaTransport>> {
        Err(TransportError::Unavailable {
            message: MESSAGE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discovery_fails() {
        let err = UnavailableConnector
            .discover_endpoints("opc.tcp://localhost:4840")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unavailable { .. }));
    }
}
