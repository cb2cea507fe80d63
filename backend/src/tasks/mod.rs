// The simulation tick loop: advance physics, append history, broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio::time::{self, MissedTickBehavior};
use tracing::warn;

use pitwall_core::track::TrackModel;

use crate::app::TelemetryStore;
use crate::utils::now_epoch_ms;
use crate::ws::TelemetryUpdateMessage;

/// Drives the single simulation context at a fixed cadence and fans each
/// tick out to every subscribed viewer. The whole tick body runs under
/// the store's write guard, so connecting viewers snapshot either before
/// or after a tick, never in the middle of one.
pub async fn tick_task(
    store: Arc<RwLock<TelemetryStore>>,
    track: Arc<TrackModel>,
    tx: broadcast::Sender<String>,
    tick_interval_ms: u64,
    rival_count: u32,
) {
    let dt_s = tick_interval_ms as f64 / 1000.0;
    let mut interval = time::interval(Duration::from_millis(tick_interval_ms));
    // If a tick overruns, fall back to best-effort cadence rather than
    // bursting to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let now_ms = now_epoch_ms();

        let mut store = store.write().await;
        let sample = store.sim.advance(&track, dt_s, now_ms);
        let rivals = store.sim.synthesize_rivals(&track, rival_count, sample.rpm);
        store.history.append(sample.clone());

        let message = TelemetryUpdateMessage {
            message_type: "TELEMETRY_UPDATE",
            timestamp: now_ms,
            main_car: sample,
            all_cars: rivals,
        };

        match serde_json::to_string(&message) {
            Ok(payload) => {
                // Fire-and-forget: a send error only means no viewer is
                // currently subscribed.
                let _ = tx.send(payload);
            }
            Err(err) => {
                warn!(?err, "failed to encode telemetry update, skipping tick broadcast");
            }
        }
    }
}
