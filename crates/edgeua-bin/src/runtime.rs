// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Startup order:
//!
//! 1. Build the [`StaticHost`] from the configuration
//! 2. Create the [`DeviceRegistry`] and seed it from the host
//! 3. Spawn the readings drain and, if enabled, the API server
//! 4. Wait for shutdown, then stop the API before the registry

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use edgeua_api::{ApiServer, AppState};
use edgeua_config::{load_config, EdgeUaConfig};
use edgeua_core::{MethodInvoker, ProtocolDriver};
use edgeua_opcua::{DeviceRegistry, OpcUaConnector, SessionSettings};

use crate::error::{BinError, BinResult};
use crate::host::{drain_readings, StaticHost, DEFAULT_READINGS_CAPACITY};
use crate::shutdown::{ShutdownCoordinator, ShutdownGuard};

// =============================================================================
// ServiceRuntime
// =============================================================================

/// The runtime that wires host, driver and API together.
pub struct ServiceRuntime {
    config: Arc<EdgeUaConfig>,
    connector: Arc<dyn OpcUaConnector>,
    shutdown: ShutdownCoordinator,
    api_enabled: bool,
}

impl ServiceRuntime {
    /// Creates a new runtime with the default connector.
    pub fn new(config: EdgeUaConfig) -> Self {
        let api_enabled = config.api.enabled;
        Self {
            config: Arc::new(config),
            connector: default_connector(),
            shutdown: ShutdownCoordinator::new(),
            api_enabled,
        }
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the service until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            service = %self.config.service.name,
            version = edgeua_core::VERSION,
            devices = self.config.devices.len(),
            "Starting EdgeUA device service"
        );

        let (host, readings) = StaticHost::from_config(&self.config, DEFAULT_READINGS_CAPACITY)?;
        let host = Arc::new(host);

        let settings = SessionSettings::default().with_request_timeout(self.config.service.request_timeout);
        let registry = Arc::new(DeviceRegistry::new(host, Arc::clone(&self.connector), settings));
        registry.initialize().await?;

        let drain = tokio::spawn(drain_readings(readings, self.shutdown.shutdown_signal()));
        let api = if self.api_enabled {
            Some(self.spawn_api(Arc::clone(&registry) as Arc<dyn MethodInvoker>)?)
        } else {
            info!("API server disabled");
            None
        };

        info!("EdgeUA device service is ready");
        self.shutdown.wait_for_shutdown().await;
        info!("Shutting down");

        if let Some(api) = api {
            match api.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "API server exited with error"),
                Err(e) => error!(error = %e, "API server task panicked"),
            }
        }

        registry.stop(false).await?;

        if let Err(e) = drain.await {
            error!(error = %e, "Readings drain task panicked");
        }

        info!("EdgeUA device service stopped");
        Ok(())
    }

    fn spawn_api(&self, invoker: Arc<dyn MethodInvoker>) -> BinResult<JoinHandle<edgeua_api::ApiResult<()>>> {
        let api = &self.config.api;
        let api_config = edgeua_api::ApiConfig::new()
            .with_host(api.host)
            .with_port(api.port)
            .with_request_timeout(api.request_timeout);

        let state = AppState::builder()
            .config(api_config)
            .invoker(invoker)
            .service_name(self.config.service.name.clone())
            .build()?;

        let server = ApiServer::new(state);
        let signal = self.shutdown.shutdown_signal();
        let guard = ShutdownGuard::new(self.shutdown.clone());

        Ok(tokio::spawn(async move {
            let result = server.run_with_shutdown(signal).await;
            drop(guard);
            result
        }))
    }
}

/// Picks the connector compiled into this build.
#[cfg(feature = "real-transport")]
pub fn default_connector() -> Arc<dyn OpcUaConnector> {
    Arc::new(edgeua_opcua::RealOpcUaConnector::new())
}

/// Picks the connector compiled into this build.
#[cfg(not(feature = "real-transport"))]
pub fn default_connector() -> Arc<dyn OpcUaConnector> {
    warn!("Built without the real-transport feature; devices will not connect");
    Arc::new(edgeua_opcua::UnavailableConnector)
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the service runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<EdgeUaConfig>,
    connector: Option<Arc<dyn OpcUaConnector>>,
    disable_api: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: EdgeUaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the OPC UA connector.
    pub fn connector(mut self, connector: Arc<dyn OpcUaConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Disables the API server regardless of configuration.
    pub fn disable_api(mut self, disable: bool) -> Self {
        self.disable_api = disable;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<ServiceRuntime> {
        let config = match self.config {
            Some(cfg) => {
                cfg.validate()?;
                cfg
            }
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path)
                    .map_err(|e| BinError::from(e).with_context(format!("Failed to load {}", path.display())))?
            }
        };

        let mut runtime = ServiceRuntime::new(config);
        if let Some(connector) = self.connector {
            runtime.connector = connector;
        }
        runtime.api_enabled &= !self.disable_api;
        Ok(runtime)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[test]
    fn test_disable_api() {
        let runtime = RuntimeBuilder::new()
            .config(EdgeUaConfig::default())
            .disable_api(true)
            .build()
            .unwrap();
        assert!(!runtime.api_enabled);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let runtime = RuntimeBuilder::new()
            .config(EdgeUaConfig::default())
            .connector(Arc::new(edgeua_opcua::UnavailableConnector))
            .disable_api(true)
            .build()
            .unwrap();

        let coordinator = runtime.shutdown_coordinator();
        let handle = tokio::spawn(runtime.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.initiate_shutdown();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("runtime should stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
