// tests/common/mod.rs

#![allow(dead_code)]

use std::time::Duration;

use quiz_gate::{config::Config, db, routes, state::AppState};
use sqlx::SqlitePool;
use url::Url;

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port. Its authorizer resolves tokens over HTTP
/// against the app itself, the same way a separate service would.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(tweak: impl FnOnce(&mut Config)) -> TestApp {
    let pool = db::memory_pool()
        .await
        .expect("Failed to create in-memory database");

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut config = Config {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: format!("127.0.0.1:{}", port),
        session_ttl: Duration::from_secs(7 * 24 * 3600),
        hash_concurrency: 2,
        hash_timeout: Duration::from_secs(5),
        store_timeout: Duration::from_secs(3),
        auth_service_url: Some(Url::parse(&address).unwrap()),
        auth_timeout: Duration::from_secs(3),
        session_purge_interval: None,
        admin_username: None,
        admin_password: None,
        admin_email: None,
    };
    tweak(&mut config);

    let state = AppState::new(pool.clone(), config).expect("Failed to build app state");
    let app = routes::create_router(state);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

/// An address nothing listens on.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        is_staff: bool,
    ) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "email": email,
                "first_name": "Test",
                "last_name": "User",
                "is_staff": is_staff
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers a fresh account and returns (username, token).
    pub async fn signed_in_user(&self, is_staff: bool) -> (String, String) {
        let username = unique_name("u");
        let response = self
            .register(&username, "secret1", &format!("{}@x.com", username), is_staff)
            .await;
        assert_eq!(response.status().as_u16(), 201);

        let body: serde_json::Value = self.login(&username, "secret1").await.json().await.unwrap();
        let token = body["token"].as_str().expect("Token not found").to_string();
        (username, token)
    }

    pub async fn seed_question(&self, correct_option: &str) -> i64 {
        let result = sqlx::query(
            r#"
            INSERT INTO questions (question_text, option_a, option_b, option_c, option_d, correct_option)
            VALUES ('Seeded question', 'a', 'b', 'c', 'd', ?)
            "#,
        )
        .bind(correct_option)
        .execute(&self.pool)
        .await
        .unwrap();
        result.last_insert_rowid()
    }

    pub async fn submit(&self, token: &str, answers: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/submit"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap();
        count
    }
}
