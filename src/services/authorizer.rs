// src/services/authorizer.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, Uri, header},
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::{error::AppError, models::user::Identity, services::sessions::SessionService};

/// Path of the identity endpoint, relative to the auth service base URL.
pub const IDENTITY_PATH: &str = "api/auth/me";

/// Turns a bearer token into an identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Identity, AppError>;
}

/// Resolves tokens against the session store in this process.
pub struct LocalResolver {
    sessions: SessionService,
}

impl LocalResolver {
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl IdentityResolver for LocalResolver {
    async fn resolve(&self, token: &str) -> Result<Identity, AppError> {
        self.sessions.resolve_identity(token).await
    }
}

/// Resolves tokens by calling the auth service's identity endpoint.
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpResolver {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, AppError> {
        let endpoint = identity_endpoint(base_url)
            .map_err(|e| AppError::InternalServerError(format!("bad auth service URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl IdentityResolver for HttpResolver {
    async fn resolve(&self, token: &str) -> Result<Identity, AppError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                AppError::AuthError(format!("auth service unreachable: {}", e.without_url()))
            })?;

        if !response.status().is_success() {
            return Err(AppError::AuthError(format!(
                "auth service answered {}",
                response.status()
            )));
        }

        response
            .json::<Identity>()
            .await
            .map_err(|e| AppError::AuthError(format!("bad identity payload: {}", e.without_url())))
    }
}

/// Joins the identity path under the base URL, keeping any path prefix
/// (`http://gateway/auth` resolves to `http://gateway/auth/api/auth/me`).
fn identity_endpoint(base_url: &Url) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(IDENTITY_PATH)
}

/// Authorization gate used by every protected route.
///
/// Fails closed: a rejected token, an unreachable auth service and a timeout
/// all surface as the same `Unauthorized`.
#[derive(Clone)]
pub struct Authorizer {
    resolver: Arc<dyn IdentityResolver>,
    timeout: Duration,
}

impl Authorizer {
    pub fn new(resolver: Arc<dyn IdentityResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub async fn authorize(&self, token: Option<&str>) -> Result<Identity, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(unauthorized)?;

        match tokio::time::timeout(self.timeout, self.resolver.resolve(token)).await {
            Ok(Ok(identity)) => Ok(identity),
            Ok(Err(e)) => {
                tracing::debug!("Token rejected: {:?}", e);
                Err(unauthorized())
            }
            Err(_) => {
                tracing::warn!(
                    "Identity resolution timed out after {}ms",
                    self.timeout.as_millis()
                );
                Err(unauthorized())
            }
        }
    }
}

fn unauthorized() -> AppError {
    AppError::AuthError("Unauthorized".to_string())
}

/// Staff-only policy.
pub fn require_staff(identity: &Identity) -> Result<(), AppError> {
    if identity.role().is_staff() {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

/// Self-or-staff policy: the caller owns the resource or is staff.
pub fn require_self_or_staff(identity: &Identity, owner: &str) -> Result<(), AppError> {
    if identity.username == owner || identity.role().is_staff() {
        Ok(())
    } else {
        Err(unauthorized())
    }
}

/// Reads the token from `Authorization: Bearer <token>`, falling back to `?token=`.
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        uri.query().and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "token")
                .map(|(_, value)| value.into_owned())
        })
    })
}

/// Axum Middleware: Authentication.
///
/// Resolves the caller's token and injects the `Identity` into the request
/// extensions for handlers to use. Any failure is 401 Unauthorized.
pub async fn auth_middleware(
    State(authorizer): State<Authorizer>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers(), req.uri());
    let identity = authorizer.authorize(token.as_deref()).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Axum Middleware: Staff Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn staff_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or_else(unauthorized)?;

    require_staff(identity)?;

    Ok(next.run(req).await)
}
