//! Quote API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, require_non_negative, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateQuoteRequest, Quote, UpdateQuoteRequest};
use crate::AppState;

/// GET /api/quotes - List quotes, newest first.
pub async fn list_quotes(State(state): State<AppState>) -> ApiResult<Vec<Quote>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_quotes().await {
        Ok(quotes) => success(quotes, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/quotes/:id - Get a single quote.
pub async fn get_quote(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Quote> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_quote(&id).await {
        Ok(Some(quote)) => success(quote, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Quote {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/quotes - Price and store a new draft quote.
pub async fn create_quote(
    State(state): State<AppState>,
    Json(request): Json<CreateQuoteRequest>,
) -> ApiResult<Quote> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.client_id.trim().is_empty() {
        return error(
            AppError::Validation("clientId is required".to_string()),
            revision_id,
        );
    }
    if request.items.is_empty() {
        return error(
            AppError::Validation("A quote needs at least one item".to_string()),
            revision_id,
        );
    }
    if let Err(e) = require_non_negative(request.discount_cents, "discountCents") {
        return error(e, revision_id);
    }

    match state.repo.create_quote(&request).await {
        Ok(quote) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(quote, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/quotes/:id - Edit a quote or move it through its lifecycle.
pub async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateQuoteRequest>,
) -> ApiResult<Quote> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.items.as_ref().is_some_and(|items| items.is_empty()) {
        return error(
            AppError::Validation("A quote needs at least one item".to_string()),
            revision_id,
        );
    }
    if let Some(discount) = request.discount_cents {
        if let Err(e) = require_non_negative(discount, "discountCents") {
            return error(e, revision_id);
        }
    }

    match state.repo.update_quote(&id, &request).await {
        Ok(quote) => {
            tracing::debug!(quote_id = %quote.id, status = quote.status.as_str(), "Quote updated");
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(quote, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/quotes/:id - Delete a quote.
pub async fn delete_quote(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_quote(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
