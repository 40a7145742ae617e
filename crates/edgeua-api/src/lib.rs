// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # edgeua-api
//!
//! HTTP surface of the EdgeUA device service.
//!
//! | Route               | Purpose                                   |
//! |---------------------|-------------------------------------------|
//! | `POST /api/v4/call` | Invoke a method resource on a device      |
//! | `GET /api/v4/ping`  | Liveness and version                      |
//!
//! Every call answers with `{id, message, statusCode}`. The `id` echoes the
//! `X-Correlation-ID` header.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use edgeua_api::{ApiConfig, ApiServer, AppState};
//! # async fn run(invoker: Arc<dyn edgeua_core::MethodInvoker>) -> edgeua_api::ApiResult<()> {
//! let state = AppState::builder()
//!     .config(ApiConfig::default())
//!     .invoker(invoker)
//!     .build()?;
//!
//! ApiServer::new(state)
//!     .run_with_shutdown(async { let _ = tokio::signal::ctrl_c().await; })
//!     .await
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, DEVICE_ERROR_MESSAGE};
pub use extractors::{CorrelationId, CORRELATION_HEADER};
pub use handlers::MethodCallRequest;
pub use response::{BaseResponse, PingResponse};
pub use server::{ApiServer, CALL_PATH, PING_PATH};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
