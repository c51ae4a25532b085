// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'submissions' table in the database.
/// `score` is always computed by the server.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub username: String,
    pub score: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'answers' table. `is_correct` is frozen at grading time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    pub selected_option: String,
    pub is_correct: bool,
}

/// One answer as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub selected_option: String,
}

/// DTO for submitting a quiz attempt. Answers are graded in order.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub submission_id: i64,
    pub score: i64,
    pub total: i64,
    pub message: String,
}

/// A stored submission with its graded answers.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub total: i64,
    pub answers: Vec<Answer>,
}
