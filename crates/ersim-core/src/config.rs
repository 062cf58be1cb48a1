//! Simulation settings shared by the CLI and the server.

use std::path::PathBuf;
use std::time::Duration;

/// Default drift interval.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Interval between drift ticks while telemetry is live.
    pub tick_interval: Duration,
    /// Directory holding the A/B trial log.
    pub trial_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK,
            trial_dir: PathBuf::from("trials"),
        }
    }
}

impl SimConfig {
    /// Default config with the tick interval given in milliseconds.
    /// Zero is raised to one millisecond.
    pub fn with_tick_ms(ms: u64) -> Self {
        Self {
            tick_interval: Duration::from_millis(ms.max(1)),
            ..Default::default()
        }
    }
}
