// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API version reported by the ping endpoint.
pub const API_VERSION: &str = "v4";

// =============================================================================
// BaseResponse
// =============================================================================

/// Envelope returned by the method endpoint, on success and on failure.
///
/// The HTTP status matches `statusCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    /// Correlation id of the request.
    pub id: String,
    /// Result text or error message.
    pub message: String,
    /// HTTP status code.
    pub status_code: u16,
}

impl BaseResponse {
    /// Creates a response envelope.
    pub fn new(id: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            status_code: status.as_u16(),
        }
    }
}

impl IntoResponse for BaseResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Ping response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    /// API version.
    pub api_version: String,
    /// Server time, RFC 3339.
    pub timestamp: String,
    /// Service name.
    pub service_name: String,
    /// Service version.
    pub version: String,
}

impl PingResponse {
    /// Creates a ping response for the named service.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            service_name: service_name.into(),
            version: crate::VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_response_serialization() {
        let response = BaseResponse::new("req-1", "42", StatusCode::OK);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": "req-1", "message": "42", "statusCode": 200 })
        );
    }

    #[test]
    fn test_ping_response() {
        let ping = PingResponse::new("edgeua");
        assert_eq!(ping.api_version, API_VERSION);
        assert_eq!(ping.service_name, "edgeua");
        assert!(chrono::DateTime::parse_from_rfc3339(&ping.timestamp).is_ok());
    }
}
