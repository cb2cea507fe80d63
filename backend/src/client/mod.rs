// Viewer-side telemetry client: maintains the WebSocket connection,
// reconstructs history from the initial replay, and tracks live updates.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use pitwall_core::model::{RivalSample, TelemetrySample};

use crate::constants::RECONNECT_DELAY_MS;
use crate::ws::ServerMessage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Default)]
struct ViewerState {
    history: VecDeque<TelemetrySample>,
    rivals: Vec<RivalSample>,
}

struct ViewerShared {
    state: Mutex<ViewerState>,
    status: Mutex<ConnectionStatus>,
    paused: AtomicBool,
    history_cap: usize,
}

impl ViewerShared {
    fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().expect("viewer status lock") = status;
    }
}

/// Handle to a background viewer connection. Consumers poll
/// [`history`](Self::history), [`rivals`](Self::rivals), and
/// [`status`](Self::status); transport failures surface only as a
/// status change followed by automatic reconnection.
pub struct ViewerClient {
    shared: Arc<ViewerShared>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ViewerClient {
    /// Spawns the connection task. `history_cap` should match the
    /// server's ring capacity so live appends stay bounded.
    pub fn connect(url: impl Into<String>, history_cap: usize) -> Self {
        let shared = Arc::new(ViewerShared {
            state: Mutex::new(ViewerState::default()),
            status: Mutex::new(ConnectionStatus::Disconnected),
            paused: AtomicBool::new(false),
            history_cap,
        });
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(connection_loop(url.into(), shared.clone(), cancel_rx));
        Self {
            shared,
            cancel: Some(cancel_tx),
            handle,
        }
    }

    pub fn history(&self) -> Vec<TelemetrySample> {
        let state = self.shared.state.lock().expect("viewer state lock");
        state.history.iter().cloned().collect()
    }

    pub fn rivals(&self) -> Vec<RivalSample> {
        let state = self.shared.state.lock().expect("viewer state lock");
        state.rivals.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.lock().expect("viewer status lock")
    }

    /// While paused, incoming updates are still read off the socket but
    /// not applied to local state.
    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Relaxed);
    }

    /// Cancels the connection task and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        let handle = &mut self.handle;
        let _ = handle.await;
    }
}

impl Drop for ViewerClient {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Connection state machine: Disconnected -> Connecting -> Connected,
/// looping back through a fixed backoff on any failure, until cancelled.
async fn connection_loop(url: String, shared: Arc<ViewerShared>, mut cancel: oneshot::Receiver<()>) {
    loop {
        shared.set_status(ConnectionStatus::Connecting);

        let connected = tokio::select! {
            _ = &mut cancel => return,
            connected = connect_async(url.as_str()) => connected,
        };

        match connected {
            Ok((stream, _)) => {
                info!(%url, "telemetry feed connected");
                shared.set_status(ConnectionStatus::Connected);
                let (mut write, mut read) = stream.split();

                loop {
                    tokio::select! {
                        _ = &mut cancel => {
                            let _ = write.send(Message::Close(None)).await;
                            shared.set_status(ConnectionStatus::Disconnected);
                            return;
                        }
                        inbound = read.next() => {
                            match inbound {
                                Some(Ok(Message::Text(text))) => apply_message(&shared, &text),
                                Some(Ok(Message::Ping(payload))) => {
                                    let _ = write.send(Message::Pong(payload)).await;
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    warn!(?err, "telemetry feed error");
                                    break;
                                }
                            }
                        }
                    }
                }
                info!("telemetry feed disconnected");
            }
            Err(err) => {
                warn!(?err, "telemetry feed connect failed");
            }
        }

        shared.set_status(ConnectionStatus::Disconnected);
        tokio::select! {
            _ = &mut cancel => return,
            _ = time::sleep(Duration::from_millis(RECONNECT_DELAY_MS)) => {}
        }
    }
}

fn apply_message(shared: &ViewerShared, text: &str) {
    if shared.paused.load(Ordering::Relaxed) {
        return;
    }

    let message: ServerMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            warn!(?err, "malformed telemetry message");
            return;
        }
    };

    let mut state = shared.state.lock().expect("viewer state lock");
    match message {
        ServerMessage::HistoryInit { data } => {
            state.history = data.into_iter().collect();
            while state.history.len() > shared.history_cap {
                state.history.pop_front();
            }
        }
        ServerMessage::TelemetryUpdate {
            main_car, all_cars, ..
        } => {
            state.history.push_back(*main_car);
            while state.history.len() > shared.history_cap {
                state.history.pop_front();
            }
            state.rivals = all_cars;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_core::physics::{SimulationContext, TICK_DT_S};
    use pitwall_core::track::TrackModel;

    fn shared(cap: usize) -> ViewerShared {
        ViewerShared {
            state: Mutex::new(ViewerState::default()),
            status: Mutex::new(ConnectionStatus::Disconnected),
            paused: AtomicBool::new(false),
            history_cap: cap,
        }
    }

    fn sample_batch(n: usize) -> Vec<TelemetrySample> {
        let track = TrackModel::demo_circuit();
        let mut ctx = SimulationContext::new(11);
        (0..n)
            .map(|i| ctx.advance(&track, TICK_DT_S, i as u64 * 10))
            .collect()
    }

    fn update_json(sample: &TelemetrySample) -> String {
        let rivals: Vec<RivalSample> = Vec::new();
        serde_json::to_string(&crate::ws::TelemetryUpdateMessage {
            message_type: "TELEMETRY_UPDATE",
            timestamp: sample.original_time,
            main_car: sample.clone(),
            all_cars: rivals,
        })
        .unwrap()
    }

    #[test]
    fn history_init_replaces_local_history() {
        let shared = shared(10);
        let samples = sample_batch(3);
        let init = serde_json::to_string(&crate::ws::HistoryInitMessage {
            message_type: "HISTORY_INIT",
            data: samples.clone(),
        })
        .unwrap();

        apply_message(&shared, &init);
        let state = shared.state.lock().unwrap();
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history[0].tick, samples[0].tick);
    }

    #[test]
    fn live_updates_append_capped_at_ring_size() {
        let shared = shared(4);
        for sample in sample_batch(9) {
            apply_message(&shared, &update_json(&sample));
        }
        let state = shared.state.lock().unwrap();
        assert_eq!(state.history.len(), 4);
        // Newest four samples survive, in order.
        assert_eq!(state.history[0].tick, 6);
        assert_eq!(state.history[3].tick, 9);
    }

    #[test]
    fn paused_viewer_ignores_incoming_updates() {
        let shared = shared(10);
        let samples = sample_batch(2);
        apply_message(&shared, &update_json(&samples[0]));
        shared.paused.store(true, Ordering::Relaxed);
        apply_message(&shared, &update_json(&samples[1]));
        assert_eq!(shared.state.lock().unwrap().history.len(), 1);

        shared.paused.store(false, Ordering::Relaxed);
        apply_message(&shared, &update_json(&samples[1]));
        assert_eq!(shared.state.lock().unwrap().history.len(), 2);
    }

    #[test]
    fn malformed_messages_are_dropped_silently() {
        let shared = shared(10);
        apply_message(&shared, "{not json");
        apply_message(&shared, "{\"type\":\"UNKNOWN\"}");
        assert!(shared.state.lock().unwrap().history.is_empty());
    }
}
