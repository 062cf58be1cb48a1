//! `ersim simulate`: headless drift run, one JSON snapshot per tick.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ersim_core::{DRIFT_THRESHOLD, ScenarioStep, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimulateConfig<'a> {
    /// Ticks to run; 0 runs until Ctrl+C.
    pub ticks: u64,
    pub start_step: u8,
    pub seed: Option<u64>,
    pub group: Option<&'a str>,
    pub interval: Option<&'a str>,
    pub output_path: Option<&'a str>,
}

pub fn run(config: SimulateConfig<'_>) {
    let interval = config.interval.map(|s| {
        super::parse_duration(s).unwrap_or_else(|| {
            eprintln!("Invalid interval: {s}");
            std::process::exit(1);
        })
    });

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let Some(start) = ScenarioStep::from_index(config.start_step) else {
        eprintln!(
            "Invalid start step: {} (expected 0-{})",
            config.start_step,
            ScenarioStep::Departed.index()
        );
        std::process::exit(1);
    };

    let mut session = match config.group {
        Some(g) => Session::with_group(super::parse_group(g)),
        None => Session::new(&mut rng),
    };
    advance_to(&mut session, start);

    if session.step() < DRIFT_THRESHOLD {
        eprintln!(
            "Note: step {} is below {}; vitals will not drift.",
            session.step().index(),
            DRIFT_THRESHOLD.index()
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    if config.ticks == 0 {
        let r = running.clone();
        if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
            eprintln!("Error setting Ctrl+C handler: {e}");
            std::process::exit(1);
        }
    }

    let out: Box<dyn Write> = match config.output_path {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(f),
            Err(e) => {
                eprintln!("Error creating {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    let result = write_ticks(&mut session, &mut rng, &mut out, config.ticks, || {
        if let Some(d) = interval {
            thread::sleep(d);
        }
        running.load(Ordering::SeqCst)
    })
    .and_then(|n| out.flush().map(|()| n));

    match result {
        Ok(n) => {
            if let Some(path) = config.output_path {
                eprintln!("Wrote {n} snapshots to {path}");
            }
        }
        Err(e) => {
            eprintln!("Error writing snapshots: {e}");
            std::process::exit(1);
        }
    }
}

/// Advance a fresh session until it reaches `target`.
fn advance_to(session: &mut Session, target: ScenarioStep) {
    while session.step() < target {
        session.advance();
    }
}

/// Tick `ticks` times (0 = until `keep_going` returns false), writing one
/// snapshot line per tick. Returns the number of lines written.
fn write_ticks<R, W, F>(
    session: &mut Session,
    rng: &mut R,
    out: &mut W,
    ticks: u64,
    mut keep_going: F,
) -> io::Result<u64>
where
    R: Rng + ?Sized,
    W: Write,
    F: FnMut() -> bool,
{
    let mut written = 0u64;
    while ticks == 0 || written < ticks {
        session.tick(rng);
        serde_json::to_writer(&mut *out, &session.snapshot()).map_err(io::Error::other)?;
        out.write_all(b"\n")?;
        written += 1;
        if !keep_going() {
            break;
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ersim_core::Group;

    #[test]
    fn advance_to_reaches_target() {
        let mut s = Session::with_group(Group::A);
        advance_to(&mut s, ScenarioStep::Departed);
        assert_eq!(s.step(), ScenarioStep::Departed);
        assert_eq!(s.step().index(), 4);
    }

    #[test]
    fn start_step_range() {
        assert_eq!(ScenarioStep::from_index(3), Some(ScenarioStep::Connected));
        assert_eq!(ScenarioStep::from_index(5), None);
    }

    #[test]
    fn writes_one_line_per_tick() {
        let mut s = Session::with_group(Group::B);
        advance_to(&mut s, ScenarioStep::Connected);
        let mut rng = StdRng::seed_from_u64(11);
        let mut buf = Vec::new();
        let n = write_ticks(&mut s, &mut rng, &mut buf, 5, || true).unwrap();
        assert_eq!(n, 5);

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        let last: serde_json::Value = serde_json::from_str(lines[4]).unwrap();
        assert_eq!(last["ticks"], 5);
        assert_eq!(last["group"], "B");
    }

    #[test]
    fn unbounded_run_stops_on_signal() {
        let mut s = Session::with_group(Group::A);
        advance_to(&mut s, ScenarioStep::Connected);
        let mut rng = StdRng::seed_from_u64(3);
        let mut buf = Vec::new();
        let mut calls = 0;
        let n = write_ticks(&mut s, &mut rng, &mut buf, 0, || {
            calls += 1;
            calls < 4
        })
        .unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn below_threshold_vitals_stay_put() {
        let mut s = Session::with_group(Group::A);
        advance_to(&mut s, ScenarioStep::Matched);
        let before = s.vitals().clone();
        let mut rng = StdRng::seed_from_u64(3);
        let mut buf = Vec::new();
        write_ticks(&mut s, &mut rng, &mut buf, 10, || true).unwrap();
        assert_eq!(*s.vitals(), before);
        assert_eq!(s.ticks(), 0);
    }
}
