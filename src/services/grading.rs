// src/services/grading.rs

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        question::AnswerOption,
        submission::{Answer, AnswerSubmission, Submission, SubmissionDetail},
    },
    utils::deadline::bounded,
};

/// Outcome of a graded batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedSubmission {
    pub submission_id: i64,
    pub score: i64,
    pub total: i64,
}

/// Grades and stores submissions as one unit per batch.
#[derive(Clone)]
pub struct GradingEngine {
    pool: SqlitePool,
    timeout: Duration,
}

impl GradingEngine {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Grades `answers` for `username` inside a single transaction.
    ///
    /// Keys are read through the same transaction as the writes. Any unknown
    /// question, invalid option or store failure drops the transaction
    /// unfinished, which rolls it back; no submission or answer row survives.
    pub async fn submit(
        &self,
        username: &str,
        answers: &[AnswerSubmission],
    ) -> Result<GradedSubmission, AppError> {
        if answers.is_empty() {
            return Err(AppError::BadRequest("No answers submitted".to_string()));
        }

        let graded = bounded(self.timeout, "submission transaction", async {
            let mut tx = self.pool.begin().await?;

            let submission_id = sqlx::query(
                "INSERT INTO submissions (username, score, created_at) VALUES (?, 0, ?)",
            )
            .bind(username)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            let mut score = 0i64;
            for answer in answers {
                let key: Option<(String,)> =
                    sqlx::query_as("SELECT correct_option FROM questions WHERE id = ?")
                        .bind(answer.question_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                let (key,) = key.ok_or(AppError::UnknownQuestion(answer.question_id))?;

                let selected = AnswerOption::parse(&answer.selected_option)
                    .ok_or_else(|| AppError::InvalidOption(answer.selected_option.clone()))?;

                let is_correct = is_correct(selected, &key);
                if is_correct {
                    score += 1;
                }

                sqlx::query(
                    r#"
                    INSERT INTO answers (submission_id, question_id, selected_option, is_correct)
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(submission_id)
                .bind(answer.question_id)
                .bind(selected.as_str())
                .bind(is_correct)
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query("UPDATE submissions SET score = ? WHERE id = ?")
                .bind(score)
                .bind(submission_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;

            Ok::<_, AppError>(GradedSubmission {
                submission_id,
                score,
                total: answers.len() as i64,
            })
        })
        .await;

        match &graded {
            Ok(g) => tracing::info!(
                "Graded submission {} for {}: {}/{}",
                g.submission_id,
                username,
                g.score,
                g.total
            ),
            Err(e) => tracing::warn!("Submission by {} rolled back: {:?}", username, e),
        }

        graded
    }

    pub async fn find(&self, submission_id: i64) -> Result<Option<SubmissionDetail>, AppError> {
        bounded(self.timeout, "submission lookup", async {
            let submission: Option<Submission> = sqlx::query_as(
                "SELECT id, username, score, created_at FROM submissions WHERE id = ?",
            )
            .bind(submission_id)
            .fetch_optional(&self.pool)
            .await?;

            let Some(submission) = submission else {
                return Ok(None);
            };

            let answers: Vec<Answer> = sqlx::query_as(
                r#"
                SELECT id, submission_id, question_id, selected_option, is_correct
                FROM answers
                WHERE submission_id = ?
                ORDER BY id ASC
                "#,
            )
            .bind(submission_id)
            .fetch_all(&self.pool)
            .await?;

            Ok::<_, AppError>(Some(SubmissionDetail {
                submission,
                total: answers.len() as i64,
                answers,
            }))
        })
        .await
    }

    /// All submissions by `username`, newest first.
    pub async fn list_for_user(&self, username: &str) -> Result<Vec<Submission>, AppError> {
        bounded(self.timeout, "submission listing", async {
            Ok::<_, AppError>(
                sqlx::query_as::<_, Submission>(
                    r#"
                    SELECT id, username, score, created_at
                    FROM submissions
                    WHERE username = ?
                    ORDER BY id DESC
                    "#,
                )
                .bind(username)
                .fetch_all(&self.pool)
                .await?,
            )
        })
        .await
    }
}

/// Compares a normalized selection with the stored key.
fn is_correct(selected: AnswerOption, key: &str) -> bool {
    AnswerOption::parse(key) == Some(selected)
}
