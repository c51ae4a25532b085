// src/main.rs

use dotenvy::dotenv;
use quiz_gate::config::{self, Config};
use quiz_gate::db;
use quiz_gate::error::AppError;
use quiz_gate::models::user::{NewAccount, Role};
use quiz_gate::routes;
use quiz_gate::services::sessions::run_purge_loop;
use quiz_gate::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(config::log_filter());
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Load configuration from environment (after tracing, so warnings are logged)
    let config = Config::from_env()?;

    // Initialize Database Pool with Retry
    let pool = db::connect_with_retry(&config.database_url, config.store_timeout).await?;
    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    let state = AppState::new(pool, config.clone())?;
    tracing::info!(
        "Password hashing limited to {} concurrent operations",
        state.hasher.ceiling()
    );

    // Seed Staff User
    if let Err(e) = seed_staff_user(&state).await {
        tracing::error!("Failed to seed staff user: {:?}", e);
    }

    if let Some(every) = config.session_purge_interval {
        tokio::spawn(run_purge_loop(state.sessions.clone(), every));
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    // Start the server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exiting");
    Ok(())
}

async fn seed_staff_user(state: &AppState) -> Result<(), AppError> {
    let config = &state.config;
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    if state.credentials.find_by_username(username).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding staff user: {}", username);
    let password_hash = state.hasher.hash(password).await?;
    let email = config
        .admin_email
        .clone()
        .unwrap_or_else(|| format!("{}@localhost.localdomain", username));

    state
        .credentials
        .create(NewAccount {
            username: username.clone(),
            email,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Staff,
        })
        .await?;
    tracing::info!("Staff user created successfully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down server...");
}
