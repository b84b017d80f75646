//! Profile API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{error, require_text, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateProfileRequest, Profile, UpdateProfileRequest};
use crate::AppState;

/// GET /api/profiles - List all profiles.
pub async fn list_profiles(State(state): State<AppState>) -> ApiResult<Vec<Profile>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_profiles().await {
        Ok(profiles) => success(profiles, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/profiles/:id - Get a single profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Profile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_profile(&id).await {
        Ok(Some(profile)) => success(profile, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Profile {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/profiles - Register a profile on the free plan.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(request): Json<CreateProfileRequest>,
) -> ApiResult<Profile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Err(e) = require_text(&request.email, "email") {
        return error(e, revision_id);
    }
    if !request.email.contains('@') {
        return error(
            AppError::Validation("email must be a valid address".to_string()),
            revision_id,
        );
    }

    match state.repo.create_profile(&request).await {
        Ok(profile) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(profile, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/profiles/:id - Update profile details. The subscription is webhook-managed.
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Profile> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.update_profile(&id, &request).await {
        Ok(profile) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(profile, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
