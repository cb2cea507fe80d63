// Per-tick telemetry for the rest of the field (director view).

use serde::{Deserialize, Serialize};

/// Cosmetic telemetry for one rival car, recomputed from the primary car
/// every tick and never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalSample {
    pub id: u32,
    pub number: String,
    pub lap: u32,
    pub speed: f64,
    pub rpm: f64,
    pub fuel_flow: f64,
    pub lambda: f64,
    pub airflow: f64,
    pub distance: f64,
    pub lap_progress: f64,
    pub gap_to_leader: String,
    pub last_lap_time: String,
}
