//! Web dashboard
//!
//! Serves the HTML page, a small JSON API, and a server-sent event stream
//! that tells open pages when a new snapshot is available.

mod events;
mod routes;

use crate::poller::MarketPoller;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state, passed to all route handlers via `axum::extract::State`.
pub struct AppState {
    pub poller: Arc<MarketPoller>,
}

impl AppState {
    pub fn new(poller: Arc<MarketPoller>) -> Arc<Self> {
        Arc::new(Self { poller })
    }
}

/// Assemble the dashboard router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(events::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the dashboard until Ctrl+C.
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully stopping…");
}
