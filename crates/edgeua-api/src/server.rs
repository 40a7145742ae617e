// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppState;

/// Path of the method invocation route.
pub const CALL_PATH: &str = "/api/v4/call";

/// Path of the liveness route.
pub const PING_PATH: &str = "/api/v4/ping";

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ));

        Router::new()
            .route(CALL_PATH, post(handlers::call_method))
            .route(PING_PATH, get(handlers::ping))
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let addr = listener.local_addr().unwrap_or_else(|_| self.config.socket_addr());

        info!(addr = %addr, "Starting API server");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server stopped");
        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use edgeua_core::{DriverError, DriverResult, MethodInvoker, Operation, Value};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::response::{BaseResponse, PingResponse};

    struct FixedInvoker;

    #[async_trait]
    impl MethodInvoker for FixedInvoker {
        async fn call_method(&self, device: &str, method: &str, _parameters: &[String]) -> DriverResult<Value> {
            match (device, method) {
                ("boiler-1", "Answer") => Ok(Value::Int32(42)),
                _ => Err(DriverError::not_found(device, Operation::Call, format!("method {}", method))),
            }
        }
    }

    fn test_server() -> ApiServer {
        let state = AppState::builder()
            .invoker(Arc::new(FixedInvoker))
            .service_name("edgeua-test")
            .build()
            .unwrap();
        ApiServer::new(state)
    }

    async fn call(body: &'static str) -> (StatusCode, BaseResponse) {
        let request = Request::builder()
            .method("POST")
            .uri(CALL_PATH)
            .header("X-Correlation-ID", "corr-1")
            .body(Body::from(body))
            .unwrap();

        let response = test_server().router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_call_success() {
        let (status, body) = call(r#"{"device":"boiler-1","method":"Answer"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.id, "corr-1");
        assert_eq!(body.message, "42");
        assert_eq!(body.status_code, 200);
    }

    #[tokio::test]
    async fn test_call_unknown_device() {
        let (status, body) = call(r#"{"device":"nope","method":"Answer"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "error interacting with device");
    }

    #[tokio::test]
    async fn test_call_bad_body() {
        let (status, body) = call("{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "invalid request");
    }

    #[tokio::test]
    async fn test_ping() {
        let request = Request::builder().uri(PING_PATH).body(Body::empty()).unwrap();
        let response = test_server().router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let ping: PingResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ping.service_name, "edgeua-test");
    }

    #[test]
    fn test_addr() {
        assert_eq!(test_server().addr().port(), crate::config::DEFAULT_PORT);
    }
}
