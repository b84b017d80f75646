//! REST API module.
//!
//! Dashboard routes return the `{success, data, revisionId}` envelope; the
//! payment webhook lives in [`webhook`] and is mounted without authentication.

mod catalog;
mod clients;
mod costs;
mod datastore;
mod notifications;
mod profiles;
mod quotes;
pub mod webhook;

pub use catalog::*;
pub use clients::*;
pub use costs::*;
pub use datastore::*;
pub use notifications::*;
pub use profiles::*;
pub use quotes::*;
pub use webhook::payment_webhook;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Reject blank required text fields.
pub(crate) fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Reject negative money or quantity fields.
pub(crate) fn require_non_negative(value: i64, field: &str) -> Result<(), AppError> {
    if value < 0 {
        return Err(AppError::Validation(format!(
            "{} must not be negative",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("Oil change", "name").is_ok());
        let err = require_text("   ", "name").unwrap_err();
        assert_eq!(err.message(), "name is required");
    }

    #[test]
    fn test_require_non_negative() {
        assert!(require_non_negative(0, "priceCents").is_ok());
        assert!(matches!(
            require_non_negative(-1, "priceCents"),
            Err(AppError::Validation(_))
        ));
    }
}
