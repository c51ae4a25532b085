// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Capability marker on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Staff,
}

impl Role {
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Staff)
    }
}

impl From<bool> for Role {
    fn from(is_staff: bool) -> Self {
        if is_staff { Role::Staff } else { Role::Standard }
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    /// Unique username, also the primary key.
    pub username: String,

    /// Unique email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    #[sqlx(rename = "password")]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,

    pub is_staff: bool,

    #[sqlx(rename = "date_joined")]
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

/// Account fields ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Username length must be between 3 and 50 characters."
        ),
        custom(function = not_blank)
    )]
    pub username: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(regex(path = *EMAIL_RE, message = "Email address is not valid."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// DTO for user login. `username` may also hold the account email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 254), custom(function = not_blank))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub is_staff: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

/// Who a token belongs to. Returned by the identity endpoint and consumed by
/// the authorizer on the other side of the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub is_staff: bool,
}

impl Identity {
    pub fn role(&self) -> Role {
        Role::from(self.is_staff)
    }
}

/// Public account view with attempt aggregates derived from graded submissions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,

    /// Sum of scores over every stored submission.
    pub score: i64,

    /// Number of stored submissions.
    pub test_attempted: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub username: String,
}

fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}
