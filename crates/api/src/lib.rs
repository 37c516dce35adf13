//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   POST   /employee
//!   GET    /employees
//!   DELETE /employee/{id}
//!   GET    /stats/median-age
//!   GET    /stats/median-salary
//!   GET    /health

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod dto;
pub mod handlers;

pub use handlers::AppState;

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    // The dashboard is served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/employee", post(handlers::employees::create))
        .route("/employees", get(handlers::employees::list))
        .route("/employee/:id", delete(handlers::employees::delete))
        .route("/stats/median-age", get(handlers::stats::median_age))
        .route("/stats/median-salary", get(handlers::stats::median_salary))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!("cannot listen for Ctrl-C, serving until killed: {e}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod router_tests;
