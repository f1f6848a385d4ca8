use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use viewer_engine::{build_router, RemoteSyncService, RestMirrorStore, UPDATE_TIMES_PATH};
use viewer_logging::{viewer_info, viewer_warn};

/// Serve the reconcile endpoint until interrupted.
pub async fn serve(addr: SocketAddr, store: RestMirrorStore) -> anyhow::Result<()> {
    let records_url = store
        .settings()
        .records_url()
        .map(|url| url.to_string())
        .unwrap_or_default();
    let service = Arc::new(RemoteSyncService::new(Arc::new(store)));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let local = listener.local_addr().context("reading bound address")?;
    viewer_info!("Listening on http://{local}{UPDATE_TIMES_PATH} (mirror {records_url})");

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving requests")?;
    viewer_info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        viewer_warn!("Listening for ctrl-c failed: {err}");
    }
}
