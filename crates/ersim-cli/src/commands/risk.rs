//! `ersim risk`: shock-index score for a single HR / SBP pair.

use ersim_core::RiskScore;
use ersim_core::risk::{CRITICAL_ABOVE, MODERATE_ABOVE};

pub fn run(heart_rate: f64, systolic: f64, json: bool) {
    let risk = RiskScore::compute(heart_rate, systolic);

    if json {
        let value = serde_json::json!({
            "heart_rate": heart_rate,
            "systolic": systolic,
            "raw": risk.raw,
            "score": risk.score_text(),
            "level": risk.level,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error encoding result: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("HR {heart_rate} / SBP {systolic}");
    println!("  Risk score: {}", risk.score_text());
    println!("  Status:     {}", risk.level);
    println!("  Bands:      > {MODERATE_ABOVE} Moderate, > {CRITICAL_ABOVE} High Critical");
}
