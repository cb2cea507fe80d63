// HTTP handlers and routing.

use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app::AppState;
use crate::utils::monotonic_ms;
use crate::ws::ws_handler;

mod types;
use types::*;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/telemetry", get(ws_handler))
        .with_state(app_state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn status(AxumState(app_state): AxumState<AppState>) -> impl IntoResponse {
    let (tick, lap, history_len) = {
        let store = app_state.store.read().await;
        (
            store.sim.tick_count(),
            store.sim.state().lap,
            store.history.len(),
        )
    };
    Json(StatusResponse {
        tick,
        lap,
        history_len,
        viewers: app_state.tx.receiver_count(),
        uptime_ms: monotonic_ms(app_state.start_instant),
    })
}
