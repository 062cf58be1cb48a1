pub mod monitor;
pub mod risk;
pub mod server;
pub mod simulate;
pub mod trials;

use std::path::PathBuf;
use std::time::Duration;

use ersim_core::{Group, Session, SimConfig};

/// Parse a `--group` flag. Case-insensitive; exits on anything but A or B.
pub fn parse_group(s: &str) -> Group {
    Group::parse(s).unwrap_or_else(|| {
        eprintln!("Invalid group: {s} (expected A or B)");
        std::process::exit(1);
    })
}

/// Build a fresh session, rolling the group unless one is forced.
pub fn make_session(group: Option<&str>) -> Session {
    match group {
        Some(g) => Session::with_group(parse_group(g)),
        None => Session::new(&mut rand::rng()),
    }
}

/// Simulation settings from CLI flags.
pub fn make_config(tick_ms: u64, trial_dir: &str) -> SimConfig {
    SimConfig {
        trial_dir: PathBuf::from(trial_dir),
        ..SimConfig::with_tick_ms(tick_ms)
    }
}

/// Parse a duration like `"250ms"`, `"2s"`, `"1m"`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric.trim().parse().ok()?;
    Some(Duration::from_millis(value.saturating_mul(multiplier)))
}
