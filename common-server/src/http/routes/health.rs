//! Health check endpoint

use axum::extract::State;
use axum::{routing::get, Router};
use serde::Serialize;

use crate::http::Reply;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `starting` until the first connection exists, then `ok` or `unavailable`.
    pub database: &'static str,
}

/// GET /health
///
/// Never waits on the connect loop; only an established handle is pinged.
async fn health(State(state): State<AppState>) -> Reply<HealthResponse> {
    let manager = state.manager().clone();
    state
        .dispatcher()
        .dispatch(async move {
            let database = match manager.ping().await {
                None => "starting",
                Some(Ok(())) => "ok",
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "database ping failed");
                    "unavailable"
                }
            };
            Ok(HealthResponse {
                status: "ok",
                version: env!("CARGO_PKG_VERSION"),
                database,
            })
        })
        .await
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
