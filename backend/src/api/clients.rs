//! Client API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, require_text, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Client, CreateClientRequest, UpdateClientRequest};
use crate::AppState;

/// GET /api/clients - List all clients.
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Vec<Client>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_clients().await {
        Ok(clients) => success(clients, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/clients/:id - Get a single client.
pub async fn get_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Client> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_client(&id).await {
        Ok(Some(client)) => success(client, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Client {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/clients - Create a new client.
pub async fn create_client(
    State(state): State<AppState>,
    Json(request): Json<CreateClientRequest>,
) -> ApiResult<Client> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_text(&request.name, "name") {
        return error(e, revision_id);
    }

    match state.repo.create_client(&request).await {
        Ok(client) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(client, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/clients/:id - Update a client.
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClientRequest>,
) -> ApiResult<Client> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Some(name) = &request.name {
        if let Err(e) = require_text(name, "name") {
            return error(e, revision_id);
        }
    }

    match state.repo.update_client(&id, &request).await {
        Ok(client) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(client, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/clients/:id - Delete a client without quotes.
pub async fn delete_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.delete_client(&id).await {
        Ok(()) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
