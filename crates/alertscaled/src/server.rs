//! Server mode — opens the replica store and serves the HTTP API until
//! Ctrl-C.

use std::net::SocketAddr;

use alertscale_core::config::GatewayConfig;
use tracing::{info, warn};

pub async fn run(gateway: GatewayConfig) -> anyhow::Result<()> {
    info!(
        default_namespace = %gateway.default_namespace,
        "alertscale daemon starting"
    );

    std::fs::create_dir_all(&gateway.data_dir)?;
    let db_path = gateway.data_dir.join("alertscale.redb");

    let store = alertscale_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "replica store opened");

    let router = alertscale_api::build_router(store, &gateway.default_namespace);
    let addr = SocketAddr::from(([0, 0, 0, 0], gateway.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "unable to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("alertscale daemon stopped");
    Ok(())
}
