//! # Userdesk API Server
//!
//! Binary entry point: loads configuration, connects to PostgreSQL, runs
//! migrations, and serves the admin-panel user-management API.
//!
//! ```bash
//! cargo run -p userdesk-api
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use userdesk_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Userdesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let addr = config.bind_address();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        return;
    }

    tracing::info!("Shutdown signal received, exiting...");
}
