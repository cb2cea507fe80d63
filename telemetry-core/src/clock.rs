// Display formatting for timestamps and lap times.

/// Formats an epoch timestamp as `HH:MM:SS.mmm` (UTC).
pub fn clock_string(epoch_ms: u64) -> String {
    let ms = epoch_ms % 1000;
    let total_secs = epoch_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}

/// Formats a lap time in milliseconds as `M:SS.cc`.
pub fn format_lap_time(ms: f64) -> String {
    let ms = ms.max(0.0);
    let mins = (ms / 60_000.0).floor() as u64;
    let secs = ((ms % 60_000.0) / 1000.0).floor() as u64;
    let centis = ((ms % 1000.0) / 10.0).floor() as u64;
    format!("{}:{:02}.{:02}", mins, secs, centis)
}
