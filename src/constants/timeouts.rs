use std::time::Duration;

/// Raid move pacing (defaults, can be overridden via env vars)
pub const DEFAULT_MOVE_DELAY_MS: u64 = 100; // Pause between relocations to stay under rate limits
pub const DEFAULT_MOVE_TIMEOUT_SECONDS: u64 = 10; // Per-relocation timeout
pub const DEFAULT_MAX_DRAIN_PASSES: u32 = 5; // Re-snapshots of the raid channel before giving up

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let total_millis = duration.as_millis();

    if total_millis < 1000 {
        format!("{} ms", total_millis)
    } else if total_millis < 60_000 {
        format!("{:.1} seconds", duration.as_secs_f64())
    } else {
        let mins = duration.as_secs() / 60;
        let secs = duration.as_secs() % 60;
        format!("{} minute{} {} s", mins, if mins == 1 { "" } else { "s" }, secs)
    }
}
