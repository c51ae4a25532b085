// src/handlers/users.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError, models::user::Identity, services::authorizer::require_self_or_staff,
    state::AppState,
};

/// Lists every account with its score aggregates.
/// Staff only (enforced by middleware).
pub async fn list_users(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("Staff user {} requested all users", identity.username);
    let users = state.users.list().await?;
    Ok(Json(users))
}

/// One account's profile. The user themself or staff only.
pub async fn get_user(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_self_or_staff(&identity, &username)?;

    let profile = state
        .users
        .profile(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(profile))
}
