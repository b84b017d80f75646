//! PSK-based authentication for the dashboard API.
//!
//! Implements constant-time comparison to mitigate timing attacks. The payment
//! webhook is mounted outside this layer.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// PSK authentication layer function that takes the expected PSK as a parameter.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    // If no PSK is configured, allow all requests (dev mode)
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    if let Some(provided) = provided_key(&request) {
        if constant_time_compare(provided, &expected) {
            return next.run(request).await;
        }
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return unauthorized_response("Invalid API key");
    }

    unauthorized_response("Missing or invalid API key")
}

/// API key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn provided_key(request: &Request) -> Option<&str> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    let error = AppError::Unauthorized(message.to_string());
    (error.status_code(), Json(ErrorResponse::new(&error, 0))).into_response()
}
