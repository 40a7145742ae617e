// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport backed by the `opcua` crate.
//!
//! The `opcua` client API is synchronous, so every service call runs on the
//! blocking pool. The session's own message loop is started with
//! `Session::run_async` and stopped on close.
//!
//! Sessions always authenticate anonymously. The client certificate and key,
//! when configured, secure the channel only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use opcua::client::prelude::{
    AttributeId, AttributeService, CallMethodRequest, Client, ClientBuilder, DataChangeCallback, DataValue,
    ExtensionObject, IdentityToken, MessageSecurityMode, MethodService, MonitoredItemCreateRequest,
    MonitoredItemService, MonitoringMode, MonitoringParameters, QualifiedName, ReadValueId, Session, SessionCommand,
    StatusCode, SubscriptionService, TimestampsToReturn, UAString, WriteValue,
};
use opcua::sync::RwLock as OpcUaRwLock;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::TransportError;
use crate::types::{NodeId, NodeIdentifier};

use super::transport::{
    CallResult, ConnectionSettings, DataChangeNotification, EndpointDescription, MonitoredItemNotification,
    NotificationSender, OpcUaConnector, OpcUaTransport, OpcUaValue, ReadResult, TransportResult, TransportState,
};

const APPLICATION_NAME: &str = "edgeua";
const APPLICATION_URI: &str = "urn:edgeua:client";
const SUBSCRIPTION_LIFETIME_COUNT: u32 = 60;
const SUBSCRIPTION_KEEPALIVE_COUNT: u32 = 20;
const MONITORED_QUEUE_SIZE: u32 = 10;

type SharedSession = Arc<OpcUaRwLock<Session>>;

// =============================================================================
// RealOpcUaConnector
// =============================================================================

/// Connector that talks to real servers.
///
/// Discovery results are kept per URL so that `open` can hand the full
/// server-side endpoint (including its certificate) to the client stack.
#[derive(Default)]
pub struct RealOpcUaConnector {
    discovered: Mutex<HashMap<String, Vec<opcua::types::EndpointDescription>>>,
}

impl RealOpcUaConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self::default()
    }

    fn build_client(settings: &ConnectionSettings) -> TransportResult<Client> {
        let config = &settings.config;
        let mut builder = ClientBuilder::new()
            .application_name(APPLICATION_NAME)
            .application_uri(APPLICATION_URI)
            .trust_server_certs(true)
            .session_retry_limit(0);
        if let (Some(cert), Some(key)) = (&config.cert_file, &config.key_file) {
            builder = builder.certificate_path(cert.as_str()).private_key_path(key.as_str());
        } else {
            builder = builder.create_sample_keypair(config.requires_credentials());
        }
        builder.client().ok_or_else(|| TransportError::Open {
            url: config.endpoint.clone(),
            message: "invalid client configuration".to_string(),
        })
    }

    fn matching_endpoint(&self, endpoint: &EndpointDescription, url: &str) -> opcua::types::EndpointDescription {
        let discovered = self.discovered.lock();
        let found = discovered.get(url).and_then(|list| {
            list.iter()
                .find(|e| {
                    e.security_policy_uri.as_ref() == endpoint.security_policy_uri
                        && e.security_mode as u32 == endpoint.security_mode
                })
                .cloned()
        });
        let mut selected = found.unwrap_or_else(|| {
            opcua::types::EndpointDescription::from((
                endpoint.endpoint_url.as_str(),
                endpoint.security_policy_uri.as_str(),
                message_security_mode(endpoint.security_mode),
            ))
        });
        selected.endpoint_url = UAString::from(endpoint.endpoint_url.as_str());
        selected
    }
}

#[async_trait]
impl OpcUaConnector for RealOpcUaConnector {
    async fn discover_endpoints(&self, url: &str) -> TransportResult<Vec<EndpointDescription>> {
        let target = url.to_string();
        let endpoints = tokio::task::spawn_blocking(move || {
            let client = ClientBuilder::new()
                .application_name(APPLICATION_NAME)
                .application_uri(APPLICATION_URI)
                .trust_server_certs(true)
                .client()
                .ok_or_else(|| TransportError::Discovery {
                    url: target.clone(),
                    message: "invalid client configuration".to_string(),
                })?;
            client
                .get_server_endpoints_from_url(target.as_str())
                .map_err(|status| TransportError::Discovery {
                    url: target.clone(),
                    message: status.to_string(),
                })
        })
        .await
        .map_err(|e| TransportError::Discovery {
            url: url.to_string(),
            message: e.to_string(),
        })??;

        tracing::debug!(url, count = endpoints.len(), "Discovered endpoints");
        let described = endpoints
            .iter()
            .map(|e| EndpointDescription {
                endpoint_url: e.endpoint_url.as_ref().to_string(),
                security_policy_uri: e.security_policy_uri.as_ref().to_string(),
                security_mode: e.security_mode as u32,
                security_level: e.security_level,
            })
            .collect();
        self.discovered.lock().insert(url.to_string(), endpoints);
        Ok(described)
    }

    async fn open(
        &self,
        endpoint: &EndpointDescription,
        settings: &ConnectionSettings,
    ) -> TransportResult<Arc<dyn OpcUaTransport>> {
        let url = settings.config.endpoint.clone();
        let selected = self.matching_endpoint(endpoint, &url);
        let mut client = Self::build_client(settings)?;

        let open_url = url.clone();
        let session = tokio::task::spawn_blocking(move || {
            client
                .connect_to_endpoint(selected, IdentityToken::Anonymous)
                .map_err(|status| TransportError::Open {
                    url: open_url,
                    message: status.to_string(),
                })
        })
        .await
        .map_err(|e| TransportError::Open {
            url: url.clone(),
            message: e.to_string(),
        })??;

        let stop = Session::run_async(Arc::clone(&session));
        tracing::info!(device = %settings.device_name, url = %url, "OPC UA session opened");
        Ok(Arc::new(RealOpcUaTransport {
            session,
            stop: Mutex::new(Some(stop)),
        }))
    }
}

impl std::fmt::Debug for RealOpcUaConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealOpcUaConnector").finish_non_exhaustive()
    }
}

// =============================================================================
// RealOpcUaTransport
// =============================================================================

struct RealOpcUaTransport {
    session: SharedSession,
    stop: Mutex<Option<oneshot::Sender<SessionCommand>>>,
}

impl RealOpcUaTransport {
    async fn blocking<T, F>(&self, service: &'static str, f: F) -> TransportResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> Result<T, StatusCode> + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let guard = session.read();
            f(&guard)
        })
        .await
        .map_err(|e| TransportError::request(service, e.to_string()))?
        .map_err(|status| TransportError::request(service, status.to_string()))
    }
}

#[async_trait]
impl OpcUaTransport for RealOpcUaTransport {
    fn state(&self) -> TransportState {
        if self.stop.lock().is_none() {
            return TransportState::Closed;
        }
        match self.session.try_read() {
            Some(session) if session.is_connected() => TransportState::Connected,
            Some(_) => TransportState::Disconnected,
            None => TransportState::Connecting,
        }
    }

    async fn close(&self) -> TransportResult<()> {
        let Some(stop) = self.stop.lock().take() else {
            return Ok(());
        };
        self.blocking("close", |session| {
            session.disconnect();
            Ok(())
        })
        .await?;
        // The message loop may already have exited on its own.
        let _ = stop.send(SessionCommand::Stop);
        Ok(())
    }

    async fn read_values(&self, nodes: &[NodeId], max_age: Duration) -> TransportResult<Vec<ReadResult>> {
        let requests: Vec<ReadValueId> = nodes.iter().map(read_value_id).collect();
        let max_age = max_age.as_millis() as f64;
        let values = self
            .blocking("read", move |session| {
                session.read(&requests, TimestampsToReturn::Both, max_age)
            })
            .await?;
        Ok(values.iter().map(read_result).collect())
    }

    async fn write_value(&self, node: &NodeId, value: OpcUaValue) -> TransportResult<u32> {
        let request = WriteValue {
            node_id: to_opcua_node_id(node),
            attribute_id: AttributeId::Value as u32,
            index_range: UAString::null(),
            value: DataValue::new_now(to_variant(&value)),
        };
        let statuses = self.blocking("write", move |session| session.write(&[request])).await?;
        statuses
            .first()
            .map(|s| s.bits())
            .ok_or_else(|| TransportError::request("write", "empty response"))
    }

    async fn call_method(
        &self,
        object: &NodeId,
        method: &NodeId,
        arguments: Vec<OpcUaValue>,
    ) -> TransportResult<CallResult> {
        let request = CallMethodRequest {
            object_id: to_opcua_node_id(object),
            method_id: to_opcua_node_id(method),
            input_arguments: Some(arguments.iter().map(to_variant).collect()),
        };
        let result = self.blocking("call", move |session| session.call(request)).await?;
        Ok(CallResult {
            status_code: result.status_code.bits(),
            outputs: result
                .output_arguments
                .unwrap_or_default()
                .iter()
                .map(from_variant)
                .collect(),
        })
    }

    async fn create_subscription(&self, interval: Duration, sink: NotificationSender) -> TransportResult<u32> {
        let interval = interval.as_millis() as f64;
        self.blocking("subscribe", move |session| {
            session.create_subscription(
                interval,
                SUBSCRIPTION_LIFETIME_COUNT,
                SUBSCRIPTION_KEEPALIVE_COUNT,
                0,
                0,
                true,
                DataChangeCallback::new(move |items| {
                    let notification = DataChangeNotification {
                        items: items
                            .iter()
                            .map(|item| MonitoredItemNotification {
                                client_handle: item.client_handle(),
                                value: item.last_value().value.as_ref().map(from_variant),
                            })
                            .collect(),
                    };
                    if sink.send(notification).is_err() {
                        tracing::trace!("Notification receiver dropped");
                    }
                }),
            )
        })
        .await
    }

    async fn create_monitored_item(
        &self,
        subscription_id: u32,
        node: &NodeId,
        client_handle: u32,
    ) -> TransportResult<u32> {
        let request = MonitoredItemCreateRequest {
            item_to_monitor: read_value_id(node),
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters {
                client_handle,
                sampling_interval: 0.0,
                filter: ExtensionObject::null(),
                queue_size: MONITORED_QUEUE_SIZE,
                discard_oldest: true,
            },
        };
        let results = self
            .blocking("monitor", move |session| {
                session.create_monitored_items(subscription_id, TimestampsToReturn::Both, &[request])
            })
            .await?;
        results
            .first()
            .map(|r| r.status_code.bits())
            .ok_or_else(|| TransportError::request("monitor", "empty response"))
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn message_security_mode(value: u32) -> MessageSecurityMode {
    match value {
        1 => MessageSecurityMode::None,
        2 => MessageSecurityMode::Sign,
        3 => MessageSecurityMode::SignAndEncrypt,
        _ => MessageSecurityMode::Invalid,
    }
}

fn read_value_id(node: &NodeId) -> ReadValueId {
    ReadValueId {
        node_id: to_opcua_node_id(node),
        attribute_id: AttributeId::Value as u32,
        index_range: UAString::null(),
        data_encoding: QualifiedName::null(),
    }
}

fn read_result(data: &DataValue) -> ReadResult {
    let status_code = data.status.map(|s| s.bits()).unwrap_or(0);
    ReadResult {
        status_code,
        value: data.value.as_ref().map(from_variant),
        source_timestamp: data.source_timestamp.map(|t| t.as_chrono()),
    }
}

fn to_opcua_node_id(node: &NodeId) -> opcua::types::NodeId {
    let ns = node.namespace_index;
    match &node.identifier {
        NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(ns, *v),
        NodeIdentifier::String(v) => opcua::types::NodeId::new(ns, v.clone()),
        NodeIdentifier::Guid(v) => opcua::types::NodeId::new(ns, opcua::types::Guid::from(*v)),
        NodeIdentifier::Opaque(v) => opcua::types::NodeId::new(ns, opcua::types::ByteString::from(v.as_slice())),
    }
}

fn from_variant(variant: &opcua::types::Variant) -> OpcUaValue {
    use opcua::types::Variant;

    match variant {
        Variant::Empty => OpcUaValue::Null,
        Variant::Boolean(v) => OpcUaValue::Boolean(*v),
        Variant::SByte(v) => OpcUaValue::SByte(*v),
        Variant::Byte(v) => OpcUaValue::Byte(*v),
        Variant::Int16(v) => OpcUaValue::Int16(*v),
        Variant::UInt16(v) => OpcUaValue::UInt16(*v),
        Variant::Int32(v) => OpcUaValue::Int32(*v),
        Variant::UInt32(v) => OpcUaValue::UInt32(*v),
        Variant::Int64(v) => OpcUaValue::Int64(*v),
        Variant::UInt64(v) => OpcUaValue::UInt64(*v),
        Variant::Float(v) => OpcUaValue::Float(*v),
        Variant::Double(v) => OpcUaValue::Double(*v),
        Variant::String(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::DateTime(v) => OpcUaValue::DateTime(v.as_chrono()),
        Variant::Guid(v) => OpcUaValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
        Variant::ByteString(v) => OpcUaValue::ByteString(v.value.clone().unwrap_or_default()),
        Variant::Array(arr) => OpcUaValue::Array(arr.values.iter().map(from_variant).collect()),
        other => OpcUaValue::String(format!("{:?}", other)),
    }
}

fn to_variant(value: &OpcUaValue) -> opcua::types::Variant {
    use opcua::types::Variant;

    match value {
        OpcUaValue::Null => Variant::Empty,
        OpcUaValue::Boolean(v) => Variant::Boolean(*v),
        OpcUaValue::SByte(v) => Variant::SByte(*v),
        OpcUaValue::Byte(v) => Variant::Byte(*v),
        OpcUaValue::Int16(v) => Variant::Int16(*v),
        OpcUaValue::UInt16(v) => Variant::UInt16(*v),
        OpcUaValue::Int32(v) => Variant::Int32(*v),
        OpcUaValue::UInt32(v) => Variant::UInt32(*v),
        OpcUaValue::Int64(v) => Variant::Int64(*v),
        OpcUaValue::UInt64(v) => Variant::UInt64(*v),
        OpcUaValue::Float(v) => Variant::Float(*v),
        OpcUaValue::Double(v) => Variant::Double(*v),
        OpcUaValue::String(v) => Variant::String(UAString::from(v.as_str())),
        OpcUaValue::DateTime(v) => Variant::DateTime(Box::new(opcua::types::DateTime::from(*v))),
        OpcUaValue::Guid(v) => Variant::Guid(Box::new(opcua::types::Guid::from(*v))),
        OpcUaValue::ByteString(v) => Variant::ByteString(opcua::types::ByteString::from(v.as_slice())),
        OpcUaValue::Array(items) => {
            let variants: Vec<Variant> = items.iter().map(to_variant).collect();
            opcua::types::Array::new(opcua::types::VariantTypeId::Variant, variants)
                .map(|array| Variant::Array(Box::new(array)))
                .unwrap_or(Variant::Empty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_conversion() {
        let node = to_opcua_node_id(&NodeId::string(2, "Line1.Temperature"));
        assert_eq!(node.namespace, 2);
        assert_eq!(node.to_string(), "ns=2;s=Line1.Temperature");
    }

    #[test]
    fn test_variant_conversion() {
        for value in [
            OpcUaValue::Boolean(true),
            OpcUaValue::Int16(-12),
            OpcUaValue::Double(25.5),
            OpcUaValue::String("on".to_string()),
        ] {
            assert_eq!(from_variant(&to_variant(&value)), value);
        }
    }

    #[test]
    fn test_security_mode_values() {
        assert_eq!(message_security_mode(1), MessageSecurityMode::None);
        assert_eq!(message_security_mode(3), MessageSecurityMode::SignAndEncrypt);
        assert_eq!(message_security_mode(9), MessageSecurityMode::Invalid);
    }
}
