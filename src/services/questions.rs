// src/services/questions.rs

use std::time::Duration;

use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::question::{AnswerOption, CreateQuestionRequest, PublicQuestion},
    utils::deadline::bounded,
};

/// Question bank storage. Plain pass-through apart from key normalization.
#[derive(Clone)]
pub struct QuestionBank {
    pool: SqlitePool,
    timeout: Duration,
}

impl QuestionBank {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn create(&self, req: CreateQuestionRequest) -> Result<i64, AppError> {
        let key = AnswerOption::parse(&req.correct_option).ok_or_else(|| {
            AppError::BadRequest("correct_option must be one of A/B/C/D".to_string())
        })?;

        bounded(self.timeout, "question insert", async {
            let result = sqlx::query(
                r#"
                INSERT INTO questions (question_text, option_a, option_b, option_c, option_d, correct_option)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(req.question_text.trim())
            .bind(&req.option_a)
            .bind(&req.option_b)
            .bind(&req.option_c)
            .bind(&req.option_d)
            .bind(key.as_str())
            .execute(&self.pool)
            .await?;
            Ok::<_, AppError>(result.last_insert_rowid())
        })
        .await
    }

    /// Every question, oldest first, without grading keys.
    pub async fn list_public(&self) -> Result<Vec<PublicQuestion>, AppError> {
        bounded(self.timeout, "question listing", async {
            Ok::<_, AppError>(
                sqlx::query_as::<_, PublicQuestion>(
                    r#"
                    SELECT id, question_text, option_a, option_b, option_c, option_d
                    FROM questions
                    ORDER BY id ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?,
            )
        })
        .await
    }
}
