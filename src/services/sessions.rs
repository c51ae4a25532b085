// src/services/sessions.rs

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{session::Session, user::Identity},
    services::credentials::CredentialStore,
    utils::{deadline::bounded, token::generate_token},
};

/// Issues opaque session tokens and resolves them back to identities.
///
/// Sessions have two states, live and expired, decided by comparing
/// `expires_at` with the clock at read time. Nothing expires them eagerly.
#[derive(Clone)]
pub struct SessionService {
    pool: SqlitePool,
    credentials: CredentialStore,
    ttl: Duration,
    timeout: Duration,
}

impl SessionService {
    pub fn new(
        pool: SqlitePool,
        credentials: CredentialStore,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            pool,
            credentials,
            ttl,
            timeout,
        }
    }

    /// Mints and persists a token for `username`. No token is returned unless
    /// the session row was written.
    pub async fn issue(&self, username: &str) -> Result<String, AppError> {
        let token = generate_token();
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AppError::InternalServerError(format!("invalid session TTL: {}", e)))?;
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AppError::InternalServerError("session TTL overflows the calendar".to_string())
        })?;

        bounded(self.timeout, "session insert", async {
            sqlx::query(
                "INSERT INTO tokens (token, username, created_at, expires_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&token)
            .bind(username)
            .bind(issued_at)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
            Ok::<_, AppError>(())
        })
        .await
        .inspect_err(|e| tracing::error!("Failed to persist session for {}: {:?}", username, e))?;

        tracing::info!("Issued session for {}", username);
        Ok(token)
    }

    /// Returns the username owning a live token.
    pub async fn validate(&self, token: &str) -> Result<String, AppError> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::BadRequest("Token missing".to_string()));
        }

        let session = bounded(self.timeout, "session lookup", async {
            Ok::<_, AppError>(
                sqlx::query_as::<_, Session>(
                    "SELECT token, username, created_at, expires_at FROM tokens WHERE token = ?",
                )
                .bind(token)
                .fetch_optional(&self.pool)
                .await?,
            )
        })
        .await?;

        match session {
            Some(session) if session.is_live_at(now) => Ok(session.username),
            _ => Err(AppError::AuthError("Invalid token".to_string())),
        }
    }

    /// Resolves a token into `{username, is_staff}`.
    ///
    /// A live token whose account is gone is treated as invalid.
    pub async fn resolve_identity(&self, token: &str) -> Result<Identity, AppError> {
        let username = self.validate(token).await?;

        match self.credentials.find_by_username(&username).await? {
            Some(account) => Ok(Identity {
                username: account.username,
                is_staff: account.is_staff,
            }),
            None => {
                tracing::warn!("Live session references missing account {}", username);
                Err(AppError::AuthError("Invalid token".to_string()))
            }
        }
    }

    /// Deletes sessions that expired at or before `now`. Returns how many were removed.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        bounded(self.timeout, "session purge", async {
            let result = sqlx::query(
                "DELETE FROM tokens WHERE expires_at IS NOT NULL AND julianday(expires_at) <= julianday(?)",
            )
            .bind(now)
            .execute(&self.pool)
            .await?;
            Ok::<_, AppError>(result.rows_affected())
        })
        .await
    }
}

/// Periodically purges expired sessions until the runtime shuts down.
pub async fn run_purge_loop(sessions: SessionService, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        match sessions.purge_expired(Utc::now()).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("Purged {} expired sessions", removed),
            Err(e) => tracing::warn!("Session purge failed: {:?}", e),
        }
    }
}
