// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the correlation id.
pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

// =============================================================================
// Correlation ID Extractor
// =============================================================================

/// Correlation id of a request.
///
/// Taken from the `X-Correlation-ID` header, or a fresh UUID v4 when the
/// header is absent or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(CorrelationId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> CorrelationId {
        let (mut parts, _) = request.into_parts();
        CorrelationId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_header_is_used() {
        let request = Request::builder()
            .header(CORRELATION_HEADER, "corr-7")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.0, "corr-7");
    }

    #[tokio::test]
    async fn test_generated_when_absent() {
        let id = extract(Request::builder().body(()).unwrap()).await;
        assert!(uuid::Uuid::parse_str(&id.0).is_ok());
    }
}
