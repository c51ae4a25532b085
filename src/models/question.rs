// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// One of the four labelled choices of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
    C,
    D,
}

impl AnswerOption {
    /// Case- and whitespace-insensitive parse: `" c "` is `C`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(AnswerOption::A),
            "B" => Some(AnswerOption::B),
            "C" => Some(AnswerOption::C),
            "D" => Some(AnswerOption::D),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerOption::A => "A",
            AnswerOption::B => "B",
            AnswerOption::C => "C",
            AnswerOption::D => "D",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'questions' table in the database.
/// Holds the grading key, so it is never serialized to clients directly.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// Grading key: 'A', 'B', 'C' or 'D'.
    pub correct_option: String,
}

/// DTO for sending question to client (excludes the grading key).
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
        }
    }
}

/// DTO for creating a new question. Staff only.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000), custom(function = not_blank))]
    pub question_text: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_a: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_b: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_c: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_option))]
    pub correct_option: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuestionResponse {
    pub id: i64,
    pub message: String,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_option(value: &str) -> Result<(), validator::ValidationError> {
    match AnswerOption::parse(value) {
        Some(_) => Ok(()),
        None => Err(validator::ValidationError::new("option_must_be_a_to_d")),
    }
}
