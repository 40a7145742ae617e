// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API error types and handling.
//!
//! Clients only ever see a short message and a coarse status. The driver
//! error behind a failed call is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use edgeua_core::DriverError;
use thiserror::Error;

use crate::response::BaseResponse;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned when the device side of a call fails.
pub const DEVICE_ERROR_MESSAGE: &str = "error interacting with device";

// =============================================================================
// ApiError
// =============================================================================

/// API error type with HTTP status code mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request (400).
    #[error("{message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// The driver failed to serve the call (500).
    #[error("{DEVICE_ERROR_MESSAGE}: {source}")]
    Device {
        /// Underlying driver error.
        #[source]
        source: DriverError,
    },

    /// Internal server error (500).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message (for logging, not user-facing).
        message: String,
    },
}

impl ApiError {
    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Device { .. } | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message safe to show to clients.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message } => message.clone(),
            ApiError::Device { .. } => DEVICE_ERROR_MESSAGE.to_string(),
            ApiError::Internal { .. } => "internal error".to_string(),
        }
    }

    /// Returns `true` if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Builds the response envelope for a request.
    pub fn into_base_response(self, request_id: impl Into<String>) -> BaseResponse {
        let status = self.status_code();
        if self.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        BaseResponse::new(request_id, self.user_message(), status)
    }
}

impl From<DriverError> for ApiError {
    fn from(source: DriverError) -> Self {
        Self::Device { source }
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_base_response(String::new()).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use edgeua_core::Operation;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::bad_request("invalid request").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::internal("boom").status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = ApiError::from(DriverError::not_found("boiler-1", Operation::Call, "device boiler-1"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_device_error_is_not_exposed() {
        let err = ApiError::from(DriverError::not_allowed("boiler-1", Operation::Call, "method 'Reset'"));
        assert_eq!(err.user_message(), DEVICE_ERROR_MESSAGE);
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_into_base_response() {
        let response = ApiError::bad_request("invalid request").into_base_response("abc");
        assert_eq!(response.id, "abc");
        assert_eq!(response.message, "invalid request");
        assert_eq!(response.status_code, 400);
    }
}
