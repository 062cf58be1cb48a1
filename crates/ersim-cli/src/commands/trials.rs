//! `ersim trials`: list recorded A/B treatment durations.

use ersim_core::TrialLog;
use ersim_core::trial::{format_elapsed, summarize};

pub fn run(dir: &str) {
    let log = TrialLog::in_dir(dir);
    let records = match log.read_all() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading {}: {e}", log.path().display());
            std::process::exit(1);
        }
    };

    if records.is_empty() {
        println!("No trials recorded in {}", log.path().display());
        return;
    }

    println!(
        "{:<22} {:<10} {:>5} {:>8}  {}",
        "Timestamp", "Patient", "Group", "Duration", "Status"
    );
    println!("{}", "-".repeat(60));
    for r in &records {
        println!(
            "{:<22} {:<10} {:>5} {:>8}  {:?}",
            r.timestamp,
            r.patient_id,
            r.group,
            format_elapsed(r.duration_secs),
            r.status
        );
    }

    println!();
    for s in summarize(&records) {
        if s.trials == 0 {
            continue;
        }
        println!(
            "  Group {}: {} trial(s), mean {:.1}s",
            s.group, s.trials, s.mean_secs
        );
    }
}
