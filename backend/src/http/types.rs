// Response payloads for the HTTP surface.

use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub tick: u64,
    pub lap: u32,
    pub history_len: usize,
    pub viewers: usize,
    pub uptime_ms: u64,
}
