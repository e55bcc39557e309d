//! # campus-server
//!
//! The Campus REST API (axum) and the pieces the `campus` binary needs to
//! serve it. Handlers are thin: they resolve the caller, call
//! [`CampusService`], and map errors through [`error::AppError`].

pub mod error;
pub mod identity;
pub mod json;
pub mod pagination;
mod routes;
pub mod seed;
pub mod state;

use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use tokio::net::TcpListener;

use campus_db::service::CampusService;

pub use state::AppState;

/// The full application router with state attached.
pub fn app(state: AppState) -> Router {
    routes::api()
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if status.is_server_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), elapsed_ms, "request");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), elapsed_ms, "request");
    }
    response
}

/// Serve on an already-bound listener until the process is interrupted.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "campus listening");
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("campus stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {error}");
        std::future::pending::<()>().await;
    }
}

/// Open the configured database and wrap it for handlers.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub async fn open_state(config: &campus_config::CampusConfig) -> anyhow::Result<AppState> {
    let service = CampusService::from_config(&config.database).await?;
    Ok(AppState::new(service, config))
}
