// src/services/credentials.rs

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::{Account, NewAccount},
    utils::deadline::bounded,
};

const ACCOUNT_COLUMNS: &str =
    "username, email, password, first_name, last_name, is_staff, date_joined";

/// Persists accounts and enforces username/email uniqueness.
///
/// The duplicate pre-check only saves a hash round; the unique constraints in
/// the schema are what actually reject a racing duplicate.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Looks up an account by exact username or exact email.
    pub async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Account>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = ?1 OR email = ?1 LIMIT 1",
            ACCOUNT_COLUMNS
        );
        bounded(self.timeout, "account lookup", async {
            Ok::<_, AppError>(sqlx::query_as::<_, Account>(&sql)
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?)
        })
        .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", ACCOUNT_COLUMNS);
        bounded(self.timeout, "account lookup", async {
            Ok::<_, AppError>(sqlx::query_as::<_, Account>(&sql)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?)
        })
        .await
    }

    /// True if either the username or the email is already taken.
    pub async fn is_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        bounded(self.timeout, "duplicate check", async {
            let existing: Option<(String,)> = sqlx::query_as(
                "SELECT username FROM users WHERE username = ? OR email = ? LIMIT 1",
            )
            .bind(username)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
            Ok::<_, AppError>(existing.is_some())
        })
        .await
    }

    /// Stores a new account. Fails with `Conflict` if the username or email exists.
    pub async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        if self.is_taken(&account.username, &account.email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        self.insert(account).await
    }

    /// Inserts without the pre-check; a duplicate is caught by the unique
    /// indexes and reported as `Conflict`.
    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let joined_at = Utc::now();

        bounded(self.timeout, "account insert", async {
            sqlx::query(
                r#"
                INSERT INTO users (username, email, password, first_name, last_name, is_staff, date_joined)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&account.username)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.role.is_staff())
            .bind(joined_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    AppError::Conflict("Username or email already exists".to_string())
                } else {
                    tracing::error!("Failed to register user: {:?}", e);
                    AppError::from(e)
                }
            })?;
            Ok::<_, AppError>(())
        })
        .await?;

        Ok(Account {
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            first_name: account.first_name,
            last_name: account.last_name,
            is_staff: account.role.is_staff(),
            joined_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory_pool, models::user::Role};

    fn new_account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.into(),
            email: email.into(),
            password_hash: "$argon2id$placeholder".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            role: Role::Standard,
        }
    }

    async fn store() -> CredentialStore {
        CredentialStore::new(memory_pool().await.unwrap(), Duration::from_secs(3))
    }

    #[tokio::test]
    async fn finds_by_username_or_email() {
        let store = store().await;
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        let by_name = store.find_by_username_or_email("alice").await.unwrap();
        let by_email = store.find_by_username_or_email("a@x.com").await.unwrap();
        assert_eq!(by_name.unwrap().email, "a@x.com");
        assert_eq!(by_email.unwrap().username, "alice");
        assert!(store.find_by_username_or_email("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_and_keeps_original() {
        let store = store().await;
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        let second = store.create(new_account("alice", "other@x.com")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.email, "a@x.com");
        assert_eq!(stored.first_name, "Alice");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = store().await;
        store.create(new_account("alice", "a@x.com")).await.unwrap();
        let second = store.create(new_account("alicia", "a@x.com")).await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn racing_duplicate_past_the_precheck_conflicts() {
        let store = store().await;
        store.create(new_account("alice", "a@x.com")).await.unwrap();

        let same_email = store.insert(new_account("alice2", "a@x.com")).await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        let same_name = store.insert(new_account("alice", "b@x.com")).await;
        assert!(matches!(same_name, Err(AppError::Conflict(_))));

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn closed_pool_is_store_unavailable() {
        let store = store().await;
        store.pool.close().await;
        let result = store.find_by_username("alice").await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }
}
