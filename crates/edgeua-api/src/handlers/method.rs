// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Method invocation handler.

use axum::{body::Bytes, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::extractors::CorrelationId;
use crate::response::BaseResponse;
use crate::state::AppState;

// =============================================================================
// Request
// =============================================================================

/// Body of a method call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCallRequest {
    /// Target device name.
    #[serde(default)]
    pub device: String,
    /// Method resource name.
    #[serde(default)]
    pub method: String,
    /// String parameters, in argument order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

impl MethodCallRequest {
    /// Parses a request body.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "Undecodable method call body");
            ApiError::bad_request("invalid request")
        })
    }

    /// Checks that the required fields are present.
    pub fn validate(&self) -> ApiResult<()> {
        if self.device.trim().is_empty() {
            return Err(ApiError::bad_request("invalid request: device is required"));
        }
        if self.method.trim().is_empty() {
            return Err(ApiError::bad_request("invalid request: method is required"));
        }
        Ok(())
    }
}

// =============================================================================
// Handler
// =============================================================================

/// POST /api/v4/call
///
/// Always answers with a [`BaseResponse`] envelope carrying the correlation
/// id.
pub async fn call_method(
    State(state): State<AppState>,
    CorrelationId(id): CorrelationId,
    body: Bytes,
) -> BaseResponse {
    match invoke(&state, &body).await {
        Ok(message) => BaseResponse::new(id, message, StatusCode::OK),
        Err(e) => e.into_base_response(id),
    }
}

async fn invoke(state: &AppState, body: &[u8]) -> ApiResult<String> {
    let request = MethodCallRequest::from_body(body)?;
    request.validate()?;

    info!(
        device = %request.device,
        method = %request.method,
        parameters = request.parameters.len(),
        "Calling method"
    );

    let output = state
        .invoker
        .call_method(&request.device, &request.method, &request.parameters)
        .await?;

    Ok(output.to_string())
}
