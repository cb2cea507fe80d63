// Shared constants for simulation timing and transport.

/// Tick cadence of the simulation loop (100 Hz).
pub const TICK_INTERVAL_MS: u64 = 10;
/// History ring capacity: 6 s of samples at the nominal tick rate.
pub const SAMPLE_BUFFER_CAP: usize = 600;
pub const RIVAL_CAR_COUNT: u32 = 20;
pub const BROADCAST_CHANNEL_CAP: usize = 256;
/// Viewer reconnect backoff.
pub const RECONNECT_DELAY_MS: u64 = 2_000;
