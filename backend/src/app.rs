// Application state shared between the tick loop and HTTP/WS handlers.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::time::Instant;

use pitwall_core::buffer::RingBuffer;
use pitwall_core::model::TelemetrySample;
use pitwall_core::physics::SimulationContext;
use pitwall_core::track::TrackModel;

/// Simulation state and sample history, guarded as one unit: the tick
/// task appends and publishes under the write guard, the WS connect path
/// snapshots under the read guard, which is what makes the history replay
/// a consistent prefix of the live stream.
pub struct TelemetryStore {
    pub sim: SimulationContext,
    pub history: RingBuffer<TelemetrySample>,
}

impl TelemetryStore {
    pub fn new(seed: u64, history_cap: usize) -> Self {
        Self {
            sim: SimulationContext::new(seed),
            history: RingBuffer::new(history_cap),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub tx: broadcast::Sender<String>,
    pub store: Arc<RwLock<TelemetryStore>>,
    pub track: Arc<TrackModel>,
    pub start_instant: Instant,
}
