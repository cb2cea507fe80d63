// Cosmetic telemetry for the rest of the field.
//
// Rivals are not independently simulated: each one is the primary car
// phase-shifted by a fixed per-car offset, with a sine envelope on speed
// and bounded jitter on the noisy channels.

use rand::Rng;

use crate::clock::format_lap_time;
use crate::model::{RivalSample, VehicleState};
use crate::track::TrackModel;

/// Fixed gap between consecutive rivals along the track, in metres.
const RIVAL_SPACING_M: f64 = 200.0;
const SPEED_ENVELOPE_KMH: f64 = 20.0;

/// Produces one sample per rival for the current tick. Holds no state
/// across ticks; `tick_s` is the shared simulation clock in seconds.
pub fn synthesize_field(
    tick_s: f64,
    state: &VehicleState,
    primary_rpm: f64,
    track: &TrackModel,
    count: u32,
    rng: &mut impl Rng,
) -> Vec<RivalSample> {
    let total_length = track.total_length_m();
    (1..=count)
        .map(|id| {
            let offset = id as f64 * RIVAL_SPACING_M;
            let distance = (state.distance_m + offset) % total_length;
            let speed =
                (state.speed_kmh + (tick_s + id as f64).sin() * SPEED_ENVELOPE_KMH).max(0.0);

            RivalSample {
                id,
                number: (id + 3).to_string(),
                lap: state.lap,
                speed,
                rpm: primary_rpm * 0.9 + rng.gen::<f64>() * 1000.0,
                fuel_flow: 90.0 + rng.gen::<f64>() * 10.0,
                lambda: 0.98,
                airflow: 400.0,
                distance,
                lap_progress: (distance / total_length) * 100.0,
                gap_to_leader: format!("+{:.1}", offset / 320.0 * 3.6),
                last_lap_time: format_lap_time(90_000.0 + rng.gen::<f64>() * 2000.0),
            }
        })
        .collect()
}
