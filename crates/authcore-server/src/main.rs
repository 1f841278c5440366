//! Authcore Server: application entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use authcore_auth::AuthContext;
use authcore_db::DbManager;
use authcore_rbac::PolicySource;
use authcore_server::config::CONFIG_ENV;
use authcore_server::{AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("authcore=info".parse()?))
        .json()
        .init();

    info!("Starting Authcore server...");

    let path = std::env::var(CONFIG_ENV).with_context(|| format!("{CONFIG_ENV} is not set"))?;
    let config = ServerConfig::from_file(&path).await?;

    let context = AuthContext::from_config(&config.auth).context("load signing keys")?;
    info!(
        kid = context.signing_key().kid(),
        service_accounts = context.service_accounts().len(),
        "keys loaded"
    );
    let policy = PolicySource::from_config(&config.policy)
        .await
        .context("load policy")?;
    let db = DbManager::connect(&config.db)
        .await
        .context("connect to SurrealDB")?;

    let state = AppState::new(
        db.client().clone(),
        Arc::new(context),
        &policy,
        Duration::from_secs(config.request_timeout_secs),
    )
    .await
    .context("build enforcer")?;

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("bind {}", config.listen))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, authcore_server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Authcore server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
