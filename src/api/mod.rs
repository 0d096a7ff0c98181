//! HTTP read API over the persisted table.
//!
//! | Route                  | Response                        |
//! |------------------------|---------------------------------|
//! | `GET /stocks`          | `{ stocks: [...], length: n }`  |
//! | `GET /summary`         | batch summary of the table      |
//! | `GET /recommendations` | table re-scored, best `top`     |
//! | `GET /chart?ticker=`   | `{ time_series: [...] }`        |
//! | `GET /health`          | `{ status: "ok" }`              |
//!
//! Errors are `{ message }` with 400 for bad parameters, 500 for storage,
//! 502 when the chart provider fails and 503 when none is configured.

pub mod error;
pub mod handlers;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use handlers::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/stocks", get(handlers::list_stocks))
        .route("/summary", get(handlers::summary))
        .route("/recommendations", get(handlers::recommendations))
        .route("/chart", get(handlers::chart))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serves the read API until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "Read API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Read API shutting down");
        })
        .await
        .context("read API server error")
}
