// src/models/session.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Represents the 'tokens' table in the database.
///
/// A session is live while `expires_at` is unset or strictly in the future.
/// Expired rows are inert and stay until the purge task removes them.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token: String,
    pub username: String,
    #[sqlx(rename = "created_at")]
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}
