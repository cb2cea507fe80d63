// Data models for vehicle state and telemetry samples.

mod rival;
mod sample;
mod state;

pub use rival::RivalSample;
pub use sample::{DrsState, TelemetrySample};
pub use state::VehicleState;
