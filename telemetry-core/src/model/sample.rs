// Immutable per-tick telemetry snapshot of the primary car.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrsState {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "CLOSED")]
    Closed,
}

impl DrsState {
    pub fn is_open(&self) -> bool {
        matches!(self, DrsState::Open)
    }
}

/// One tick's worth of channels, created by the physics tick and never
/// mutated afterwards. Field names follow the dashboard wire format.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Tick counter at the time the sample was produced. Viewers use it to
    /// verify replay continuity across the history handoff.
    pub tick: u64,
    /// Wall-clock time as `HH:MM:SS.mmm`.
    pub timestamp: String,
    pub original_time: u64,

    // Driver biometrics.
    pub heart_rate: f64,
    pub breath: f64,
    pub stress: f64,

    // Race state.
    pub lap_progress: f64,
    pub lap: u32,
    pub last_lap_time: String,
    pub current_lap_time: String,

    // Controls.
    pub steering: f64,
    pub throttle: f64,
    pub brake: f64,
    pub gear: u8,
    pub drs_status: DrsState,

    // Physics.
    pub speed: f64,
    pub rpm: f64,
    pub g_lat: f64,
    pub g_long: f64,
    pub heading: f64,

    // Powertrain.
    pub oil_temp: f64,
    pub oil_pressure: f64,
    pub water_temp: f64,
    pub gearbox_temp: f64,
    pub fuel_flow: f64,
    pub fuel: f64,
    pub turbo_boost: f64,
    pub exhaust_temp: f64,
    pub battery_voltage: f64,

    // Tires and brakes.
    pub fl_temp: f64,
    pub fr_temp: f64,
    pub rl_temp: f64,
    pub rr_temp: f64,
    pub fl_press: f64,
    pub fr_press: f64,
    pub rl_press: f64,
    pub rr_press: f64,
    pub brake_pressure: f64,

    // Aero and suspension.
    pub front_wing_load: f64,
    pub rear_wing_load: f64,
    pub suspension_fl: f64,
    pub suspension_fr: f64,
    pub suspension_rl: f64,
    pub suspension_rr: f64,

    // Environment.
    pub air_temp: f64,
    pub track_temp: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_dir: String,
    pub gps_sats: u8,
}
