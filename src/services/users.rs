// src/services/users.rs

use std::time::Duration;

use sqlx::SqlitePool;

use crate::{error::AppError, models::user::UserProfile, utils::deadline::bounded};

const PROFILE_QUERY: &str = r#"
    SELECT u.username, u.email, u.first_name, u.last_name, u.is_staff,
           COALESCE(SUM(s.score), 0) AS score,
           COUNT(s.id) AS test_attempted
    FROM users u
    LEFT JOIN submissions s ON s.username = u.username
"#;

/// Read-only view over accounts. Scores and attempt counts are aggregated
/// from `submissions`, so they move exactly when a graded batch commits.
#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
    timeout: Duration,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Every account, ordered by username.
    pub async fn list(&self) -> Result<Vec<UserProfile>, AppError> {
        let sql = format!("{} GROUP BY u.username ORDER BY u.username ASC", PROFILE_QUERY);
        bounded(self.timeout, "user listing", async {
            Ok::<_, AppError>(
                sqlx::query_as::<_, UserProfile>(&sql)
                    .fetch_all(&self.pool)
                    .await?,
            )
        })
        .await
    }

    pub async fn profile(&self, username: &str) -> Result<Option<UserProfile>, AppError> {
        let sql = format!("{} WHERE u.username = ? GROUP BY u.username", PROFILE_QUERY);
        bounded(self.timeout, "user profile", async {
            Ok::<_, AppError>(
                sqlx::query_as::<_, UserProfile>(&sql)
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?,
            )
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_pool,
        models::{
            submission::AnswerSubmission,
            user::{NewAccount, Role},
        },
        services::{credentials::CredentialStore, grading::GradingEngine},
    };

    const TIMEOUT: Duration = Duration::from_secs(3);

    async fn setup() -> (UserDirectory, GradingEngine, i64) {
        let pool = memory_pool().await.unwrap();
        let credentials = CredentialStore::new(pool.clone(), TIMEOUT);
        for (username, role) in [("bob", Role::Standard), ("alice", Role::Staff)] {
            credentials
                .create(NewAccount {
                    username: username.into(),
                    email: format!("{}@x.com", username),
                    password_hash: "$argon2id$placeholder".into(),
                    first_name: String::new(),
                    last_name: String::new(),
                    role,
                })
                .await
                .unwrap();
        }
        let question_id = sqlx::query(
            "INSERT INTO questions (question_text, correct_option) VALUES ('Q', 'B')",
        )
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        (
            UserDirectory::new(pool.clone(), TIMEOUT),
            GradingEngine::new(pool, TIMEOUT),
            question_id,
        )
    }

    fn answer(question_id: i64, option: &str) -> AnswerSubmission {
        AnswerSubmission {
            question_id,
            selected_option: option.into(),
        }
    }

    #[tokio::test]
    async fn profile_without_submissions_has_zero_aggregates() {
        let (directory, _, _) = setup().await;
        let bob = directory.profile("bob").await.unwrap().unwrap();
        assert_eq!((bob.score, bob.test_attempted), (0, 0));
        assert!(!bob.is_staff);
        assert!(directory.profile("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn aggregates_follow_committed_submissions() {
        let (directory, grading, q) = setup().await;
        grading.submit("bob", &[answer(q, "B")]).await.unwrap();
        grading.submit("bob", &[answer(q, "A")]).await.unwrap();
        assert!(grading.submit("bob", &[answer(q + 100, "B")]).await.is_err());

        let bob = directory.profile("bob").await.unwrap().unwrap();
        assert_eq!(bob.score, 1);
        assert_eq!(bob.test_attempted, 2);
    }

    #[tokio::test]
    async fn listing_is_ordered_and_complete() {
        let (directory, grading, q) = setup().await;
        grading.submit("alice", &[answer(q, "B")]).await.unwrap();

        let users = directory.list().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["alice", "bob"]);
        assert_eq!(users[0].score, 1);
        assert!(users[0].is_staff);
        assert_eq!(users[1].test_attempted, 0);
    }
}
