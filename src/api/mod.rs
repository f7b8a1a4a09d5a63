//! REST API serving a computed weekly plan.
//!
//! Provides three GET endpoints:
//! - `/plan`: prices, all day records, and the summary
//! - `/days`: day records with optional 1-based `from`/`to` filtering
//! - `/summary`: weekly summary only

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::optimize::WeeklyPlan;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the pipeline run completes and wrapped in `Arc`;
/// all data is read-only.
pub struct AppState {
    pub plan: WeeklyPlan,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/plan", get(handlers::get_plan))
        .route("/days", get(handlers::get_days))
        .route("/summary", get(handlers::get_summary))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
