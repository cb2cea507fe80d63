// Telemetry simulation and distribution server for the Pitwall dashboard.

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;
use tracing::info;

use pitwall_core::track::TrackModel;
use pitwall_server::app::{AppState, TelemetryStore};
use pitwall_server::constants::{
    BROADCAST_CHANNEL_CAP, RIVAL_CAR_COUNT, SAMPLE_BUFFER_CAP, TICK_INTERVAL_MS,
};
use pitwall_server::http;
use pitwall_server::tasks;
use pitwall_server::utils::now_epoch_ms;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .expect("invalid HTTP_BIND or HTTP_PORT");

    let tick_interval_ms = env::var("PITWALL_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(TICK_INTERVAL_MS);
    let history_cap = env::var("PITWALL_HISTORY_CAP")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|cap| *cap > 0)
        .unwrap_or(SAMPLE_BUFFER_CAP);
    let rival_count = env::var("PITWALL_RIVALS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(RIVAL_CAR_COUNT);
    let seed = env::var("PITWALL_SEED")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(now_epoch_ms);

    let track = Arc::new(TrackModel::demo_circuit());
    let store = Arc::new(RwLock::new(TelemetryStore::new(seed, history_cap)));
    let (tx, _) = broadcast::channel::<String>(BROADCAST_CHANNEL_CAP);

    let tick_store = store.clone();
    let tick_track = track.clone();
    let tick_tx = tx.clone();
    tokio::spawn(async move {
        tasks::tick_task(tick_store, tick_track, tick_tx, tick_interval_ms, rival_count).await;
    });

    let app_state = AppState {
        tx,
        store,
        track,
        start_instant: Instant::now(),
    };

    let app = http::router(app_state);

    info!(%addr, tick_interval_ms, history_cap, rival_count, "starting telemetry server");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .expect("server failed");
}
