// src/handlers/questions.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, CreateQuestionResponse},
    state::AppState,
    utils::json::AppJson,
};

/// Lists every question. Grading keys are never included.
pub async fn list_questions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let questions = state.questions.list_public().await?;
    Ok(Json(questions))
}

/// Adds a question to the bank.
/// Staff only (enforced by middleware).
pub async fn create_question(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = state.questions.create(payload).await?;

    Ok(Json(CreateQuestionResponse {
        id,
        message: "Question added".to_string(),
    }))
}
