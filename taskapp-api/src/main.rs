//! # taskapp API Server
//!
//! Account and session backend: registration, login/logout, profile
//! management and avatars over a PostgreSQL (or in-memory) user store.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=memory JWT_SECRET=$(openssl rand -hex 32) cargo run -p taskapp-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use taskapp_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskapp_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    notify::{LogMailer, Mailer, SendGridMailer},
    store::{InMemoryUserStore, PgUserStore, UserStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskapp_api=debug,taskapp_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "taskapp API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let mailer: Arc<dyn Mailer> = match &config.mail.sendgrid_api_key {
        Some(key) => Arc::new(SendGridMailer::new(key.clone())),
        None => {
            tracing::warn!("SENDGRID_API_KEY not set, emails will only be logged");
            Arc::new(LogMailer::new())
        }
    };

    let pool = if config.database.is_memory() {
        None
    } else {
        let pool = create_pool(DatabaseConfig::from_url(
            config.database.url.clone(),
            config.database.max_connections,
        ))
        .await
        .context("Failed to connect to database")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        Some(pool)
    };

    let store: Arc<dyn UserStore> = match &pool {
        Some(pool) => Arc::new(PgUserStore::new(pool.clone())),
        None => {
            tracing::warn!("Using in-memory store, data will be lost on exit");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, mailer, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
