use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tower_sessions::session_store::ExpiredDeletion;
use tracing::{error, info};

use crate::api;
use crate::config::Config;

/// How often expired sessions are purged from the store.
const SESSION_SWEEP_SECS: u64 = 60 * 60;

pub async fn cmd_serve(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate()?;

    info!(
        "Showtracker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let sessions = api::session_store(&state).await?;
    let sweeper = tokio::spawn(async move {
        if let Err(e) = sessions
            .continuously_delete_expired(tokio::time::Duration::from_secs(SESSION_SWEEP_SECS))
            .await
        {
            error!("Session cleanup stopped: {}", e);
        }
    });

    let app = api::router(state).await?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
