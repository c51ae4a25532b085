// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{
        LoginRequest, LoginResponse, NewAccount, RegisterRequest, RegisterResponse, Role,
        ValidateResponse,
    },
    services::authorizer::extract_token,
    state::AppState,
    utils::{deadline::bounded, json::AppJson},
};

/// Registers a new user.
///
/// Hashes the password using Argon2 (under the hash limiter) before storing it.
/// Returns 201 Created, or 409 if the username or email is taken.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Skip the expensive hash when the duplicate is already visible.
    if state
        .credentials
        .is_taken(&payload.username, &payload.email)
        .await?
    {
        return Err(AppError::Conflict(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = bounded(
        state.config.hash_timeout,
        "password hashing",
        state.hasher.hash(&payload.password),
    )
    .await?;

    let account = state
        .credentials
        .create(NewAccount {
            username: payload.username,
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: Role::from(payload.is_staff),
        })
        .await?;

    tracing::info!("Registered user {}", account.username);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
        }),
    ))
}

/// Authenticates a user and returns an opaque session token.
///
/// `username` may be either the username or the email. Unknown accounts and
/// wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let account = state
        .credentials
        .find_by_username_or_email(&payload.username)
        .await?
        .ok_or_else(invalid_credentials)?;

    let is_valid = bounded(
        state.config.hash_timeout,
        "password verification",
        state.hasher.verify(&payload.password, &account.password_hash),
    )
    .await?;

    if !is_valid {
        tracing::info!("Failed login for {}", account.username);
        return Err(invalid_credentials());
    }

    let token = state.sessions.issue(&account.username).await?;

    Ok(Json(LoginResponse {
        token,
        is_staff: account.is_staff,
    }))
}

/// Checks a token and returns its owner.
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<impl IntoResponse, AppError> {
    let token = required_token(&headers, &uri)?;
    let username = state.sessions.validate(&token).await?;
    Ok(Json(ValidateResponse { username }))
}

/// Resolves a token into `{username, is_staff}`. Other services call this
/// to authorize their own requests.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<impl IntoResponse, AppError> {
    let token = required_token(&headers, &uri)?;
    let identity = state.sessions.resolve_identity(&token).await?;
    Ok(Json(identity))
}

fn required_token(headers: &HeaderMap, uri: &Uri) -> Result<String, AppError> {
    extract_token(headers, uri).ok_or_else(|| AppError::BadRequest("Token missing".to_string()))
}

fn invalid_credentials() -> AppError {
    AppError::AuthError("Invalid username or password".to_string())
}
