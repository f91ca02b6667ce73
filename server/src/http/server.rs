use anyhow::Result;
use axum::{Router, http::StatusCode, routing::get};
use std::{sync::Arc, time::Duration};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use super::{handlers, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::redirect_root))
        .route("/charm-info", get(handlers::serve_info))
        .route("/charm/*id", get(handlers::serve_charm))
        .route("/stats/*path", get(handlers::serve_stats))
        .route(handlers::LIVENESS_PATH, get(handlers::serve_liveness_key))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Answers 408 for requests still running after `timeout`.
pub fn with_request_timeout(app: Router, timeout: Option<Duration>) -> Router {
    match timeout {
        Some(timeout) => app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        )),
        None => app,
    }
}

/// Serves the public API on `bind_address` until the listener fails.
pub async fn start_server(
    state: Arc<AppState>,
    bind_address: &str,
    request_timeout: Option<Duration>,
) -> Result<()> {
    let app = with_request_timeout(router(state), request_timeout);

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
