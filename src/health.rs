//! Liveness endpoint for the hosting platform.
//!
//! Every path and method answers `200 Bot is active`. The server holds no
//! bot state.

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{Error, Result};

pub const ALIVE_BODY: &str = "Bot is active";

/// Router answering every request with the liveness body.
pub fn health_routes() -> Router {
    Router::new().fallback(alive)
}

async fn alive() -> impl IntoResponse {
    (StatusCode::OK, ALIVE_BODY)
}

/// Bind `0.0.0.0:{port}` and serve the liveness router on its own task.
pub async fn spawn_health_server(port: u16) -> Result<tokio::task::JoinHandle<()>> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(Error::Health)?;
    info!(port, "Health server started");
    Ok(serve(listener))
}

/// Serve the liveness router on an already-bound listener.
pub fn serve(listener: TcpListener) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_routes()).await {
            error!("Health server stopped: {}", e);
        }
    })
}
