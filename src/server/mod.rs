//! Server - axum HTTP service for `/api/users/**`

mod routes;

pub use routes::{cors_layer, router, ServerState};

use axum::Router;
use tokio::net::TcpListener;

use crate::runtime::Shutdown;

/// Serve `router` on `listener` until `shutdown` fires.
pub async fn serve(listener: TcpListener, router: Router, shutdown: Shutdown) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;
    tracing::info!("server stopped");
    Ok(())
}
