use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use petstore_api::app::{self, AppState};
use petstore_api::auth::{CredentialStore, TokenService};
use petstore_api::config::{AppConfig, DatabaseBackend};
use petstore_api::database::{HealthCheck, MemoryStore, PetRepository, PgStore, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET_KEY, DB_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A missing JWT_SECRET_KEY stops the process here, before anything binds.
    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!("Starting pet store API in {:?} mode", config.environment);

    match config.database.backend {
        DatabaseBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            let store = Arc::new(store);
            let result = serve(&config, store.clone()).await;
            store.close().await;
            result
        }
        DatabaseBackend::Memory => {
            tracing::warn!("using the in-memory store; all data is lost on exit");
            serve(&config, Arc::new(MemoryStore::new())).await
        }
    }
}

async fn serve<S>(config: &AppConfig, store: Arc<S>) -> anyhow::Result<()>
where
    S: UserRepository + PetRepository + HealthCheck + 'static,
{
    let tokens = Arc::new(TokenService::new(&config.security.jwt_secret)?);
    let state = AppState::new(store, tokens, CredentialStore::new(), config);

    if let Some(admin) = &config.admin {
        state
            .users
            .ensure_admin(admin)
            .await
            .context("failed to create bootstrap admin")?;
    }

    let app = app::router(state, &config.security.cors_origins);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Pet store API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
