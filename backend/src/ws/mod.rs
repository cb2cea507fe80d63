// WebSocket transport layer for telemetry streaming.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use pitwall_core::model::{RivalSample, TelemetrySample};

use crate::app::AppState;

/// Sent once, immediately after connection establishment.
#[derive(Serialize)]
pub struct HistoryInitMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub data: Vec<TelemetrySample>,
}

/// Sent every tick to every connected viewer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryUpdateMessage {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub timestamp: u64,
    pub main_car: TelemetrySample,
    pub all_cars: Vec<RivalSample>,
}

/// Inbound view of the protocol, used by the viewer client.
#[derive(Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "HISTORY_INIT")]
    HistoryInit { data: Vec<TelemetrySample> },
    #[serde(rename = "TELEMETRY_UPDATE")]
    #[serde(rename_all = "camelCase")]
    TelemetryUpdate {
        timestamp: u64,
        main_car: Box<TelemetrySample>,
        all_cars: Vec<RivalSample>,
    },
}

pub async fn ws_handler(
    AxumState(app_state): AxumState<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(mut socket: WebSocket, app_state: AppState) {
    info!("viewer connected");

    // Subscribe and snapshot under the store guard. The tick task
    // publishes while holding the write guard, so no update can land
    // between these two steps: the replay ends at tick T and the live
    // stream resumes at T+1.
    let (mut rx, history) = {
        let store = app_state.store.read().await;
        (app_state.tx.subscribe(), store.history.snapshot())
    };

    let init = HistoryInitMessage {
        message_type: "HISTORY_INIT",
        data: history,
    };
    if let Ok(payload) = serde_json::to_string(&init) {
        if socket.send(Message::Text(payload)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Ok(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "viewer lagging, dropping missed updates");
                        continue;
                    }
                    Err(_) => break,
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(?err, "viewer socket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
    info!("viewer disconnected");
}
