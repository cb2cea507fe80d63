// Crate root for the Pitwall telemetry server modules.

pub mod app;
pub mod client;
pub mod constants;
pub mod http;
pub mod tasks;
pub mod utils;
pub mod ws;
