// src/handlers/submissions.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        submission::{SubmitRequest, SubmitResponse},
        user::Identity,
    },
    services::authorizer::require_self_or_staff,
    state::AppState,
    utils::json::AppJson,
};

/// Grades a batch of answers for the caller.
///
/// The score is computed server-side; the batch is stored entirely or not at all.
pub async fn submit(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let graded = state.grading.submit(&identity.username, &req.answers).await?;

    Ok(Json(SubmitResponse {
        submission_id: graded.submission_id,
        score: graded.score,
        total: graded.total,
        message: "Submission saved".to_string(),
    }))
}

/// Returns one submission with its graded answers. Owner or staff only.
pub async fn get_submission(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state
        .grading
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    require_self_or_staff(&identity, &detail.submission.username)?;

    Ok(Json(detail))
}

/// Lists a user's submissions, newest first. The user themself or staff only.
pub async fn list_user_submissions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    require_self_or_staff(&identity, &username)?;

    let submissions = state.grading.list_for_user(&username).await?;
    Ok(Json(submissions))
}
