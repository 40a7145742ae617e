// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use edgeua_core::MethodInvoker;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Service name reported when none is configured.
pub const DEFAULT_SERVICE_NAME: &str = "edgeua";

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Driver that serves method calls.
    pub invoker: Arc<dyn MethodInvoker>,
    /// Service name reported by ping.
    pub service_name: Arc<str>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    invoker: Option<Arc<dyn MethodInvoker>>,
    service_name: Option<String>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the method invoker.
    pub fn invoker(mut self, invoker: Arc<dyn MethodInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Sets the service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Builds the AppState.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Internal` if no invoker was set.
    pub fn build(self) -> ApiResult<AppState> {
        let invoker = self
            .invoker
            .ok_or_else(|| ApiError::internal("method invoker is required"))?;

        Ok(AppState {
            config: Arc::new(self.config.unwrap_or_default()),
            invoker,
            service_name: self
                .service_name
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string())
                .into(),
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<dyn MethodInvoker> {
    fn from_ref(state: &AppState) -> Self {
        state.invoker.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edgeua_core::{DriverResult, Value};

    struct Echo;

    #[async_trait]
    impl MethodInvoker for Echo {
        async fn call_method(&self, _device: &str, method: &str, _parameters: &[String]) -> DriverResult<Value> {
            Ok(Value::String(method.to_string()))
        }
    }

    #[test]
    fn test_builder_requires_invoker() {
        let err = AppState::builder().build().unwrap_err();
        assert!(err.is_server_error());
    }

    #[test]
    fn test_builder_defaults() {
        let state = AppState::builder().invoker(Arc::new(Echo)).build().unwrap();
        assert_eq!(&*state.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(state.config.port, crate::config::DEFAULT_PORT);
    }
}
