use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    services::{
        authorizer::{Authorizer, HttpResolver, IdentityResolver, LocalResolver},
        credentials::CredentialStore,
        grading::GradingEngine,
        questions::QuestionBank,
        sessions::SessionService,
        users::UserDirectory,
    },
    utils::hash::HashLimiter,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub hasher: HashLimiter,
    pub credentials: CredentialStore,
    pub sessions: SessionService,
    pub authorizer: Authorizer,
    pub questions: QuestionBank,
    pub grading: GradingEngine,
    pub users: UserDirectory,
}

impl AppState {
    /// Wires every component from one pool and one configuration.
    ///
    /// With `auth_service_url` set, tokens are resolved over HTTP; otherwise
    /// the authorizer calls the session service directly.
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, AppError> {
        let credentials = CredentialStore::new(pool.clone(), config.store_timeout);
        let sessions = SessionService::new(
            pool.clone(),
            credentials.clone(),
            config.session_ttl,
            config.store_timeout,
        );

        let resolver: Arc<dyn IdentityResolver> = match &config.auth_service_url {
            Some(url) => {
                tracing::info!("Resolving identities via {}", url);
                Arc::new(HttpResolver::new(url, config.auth_timeout)?)
            }
            None => Arc::new(LocalResolver::new(sessions.clone())),
        };

        Ok(Self {
            hasher: HashLimiter::new(config.hash_concurrency),
            authorizer: Authorizer::new(resolver, config.auth_timeout),
            questions: QuestionBank::new(pool.clone(), config.store_timeout),
            grading: GradingEngine::new(pool.clone(), config.store_timeout),
            users: UserDirectory::new(pool.clone(), config.store_timeout),
            credentials,
            sessions,
            pool,
            config,
        })
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Authorizer {
    fn from_ref(state: &AppState) -> Self {
        state.authorizer.clone()
    }
}
