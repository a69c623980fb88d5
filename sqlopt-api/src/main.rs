//! # SQL Optimizer API Server
//!
//! Serves the SQL optimizer over HTTP: registration and login, LLM-backed
//! query analysis with a daily quota, saved history, and admin analytics.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=sqlite://sqlopt.db JWT_SECRET=... OPENAI_API_KEY=... cargo run -p sqlopt-api
//! ```

use sqlopt_api::{
    app::{build_router, AppState},
    config::Config,
};
use sqlopt_shared::db::pool::DatabaseConfig;
use sqlopt_shared::llm::{OpenAiClient, OpenAiConfig};
use sqlopt_shared::store;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqlopt_api=debug,sqlopt_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "SQL Optimizer API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store = store::connect(&DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    tracing::info!(backend = store.backend(), "Store ready");

    let llm = OpenAiClient::new(OpenAiConfig {
        api_key: config.openai.api_key.clone(),
        base_url: config.openai.base_url.clone(),
        model: config.openai.model.clone(),
        timeout_seconds: config.openai.timeout_seconds,
    })?;
    tracing::info!(model = %config.openai.model, "Completion client ready");

    if config.admin_emails.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty; only stored admin flags grant admin access");
    }

    let address = config.bind_address();
    let state = AppState::new(store.clone(), Arc::new(llm), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
