//! AI clinical analysis behind a provider seam.
//!
//! The dashboard only ever renders free text, so every failure collapses into
//! placeholder text at this boundary. [`CannedAnalysis`] is the only shipped
//! provider; it returns a fixed SOAP note and summary.

use std::io;

use serde_json::Value;

/// Shown when the provider has no analysis for a patient.
pub const MISSING_ANALYSIS: &str = "No analysis result is stored for this patient.";
/// Shown when the provider could not be reached.
pub const UNAVAILABLE_ANALYSIS: &str =
    "Analysis service unavailable. Showing placeholder for demonstration.";

/// Source of free-text clinical analysis.
pub trait AnalysisProvider: Send + Sync {
    /// Full SOAP-style analysis report. `Ok(None)` when nothing is stored.
    fn fetch_analysis(&self, patient_id: &str) -> io::Result<Option<String>>;

    /// Raw summary payload, usually JSON with a `steps[].why` list.
    fn fetch_summary(&self, patient_id: &str) -> io::Result<Option<String>>;

    /// Provider name for logs.
    fn name(&self) -> &'static str;
}

/// Fixed responses, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedAnalysis;

const CANNED_SOAP: &str = "Subjective:
- 63-year-old male in emergency transport. Alert, no chest pain reported.

Objective:
- BP: 140/90 mmHg (hypertensive)
- HR: 112 bpm (tachycardia)
- Metabolic syndrome score: 3/5
- Vascular age: +9 years vs actual

Assessment:
- Metabolic syndrome with acute hypertension risk.
- Rapid deterioration in BP control noted (+20 mmHg slope).

Plan:
- Immediate: ABGA, serum Mg level.
- Diagnostic: carotid ultrasound to assess vascular status.
- Monitor: continuous EKG for arrhythmia.";

const CANNED_SUMMARY: &str = r#"{"steps":[
{"why":"Systolic trend rising over the last three readings; rule out hypertensive emergency."},
{"why":"Tachycardia with preserved SpO2 suggests volume status check before vasoactive drugs."},
{"why":"Shock index above 0.55 warrants early imaging to exclude intracranial cause."}
]}"#;

impl AnalysisProvider for CannedAnalysis {
    fn fetch_analysis(&self, _patient_id: &str) -> io::Result<Option<String>> {
        Ok(Some(CANNED_SOAP.to_string()))
    }

    fn fetch_summary(&self, _patient_id: &str) -> io::Result<Option<String>> {
        Ok(Some(CANNED_SUMMARY.to_string()))
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

/// Analysis text for display; never fails.
pub fn analysis_or_placeholder(provider: &dyn AnalysisProvider, patient_id: &str) -> String {
    match provider.fetch_analysis(patient_id) {
        Ok(Some(text)) => text,
        Ok(None) => MISSING_ANALYSIS.to_string(),
        Err(e) => {
            log::warn!(
                "analysis provider '{}' failed for {patient_id}: {e}",
                provider.name()
            );
            UNAVAILABLE_ANALYSIS.to_string()
        }
    }
}

/// Summary steps for display. Empty when unavailable.
pub fn summary_steps(provider: &dyn AnalysisProvider, patient_id: &str) -> Vec<String> {
    match provider.fetch_summary(patient_id) {
        Ok(Some(raw)) => parse_summary_steps(&raw),
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!(
                "summary provider '{}' failed for {patient_id}: {e}",
                provider.name()
            );
            Vec::new()
        }
    }
}

/// Extract `steps[].why` from a summary payload.
///
/// Anything that is not a JSON object with a `steps` array is returned whole
/// as a single step.
pub fn parse_summary_steps(raw: &str) -> Vec<String> {
    let parsed: Option<Vec<Value>> = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("steps").and_then(Value::as_array).cloned());

    match parsed {
        Some(steps) => steps
            .iter()
            .filter_map(|s| s.get("why").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        None => vec![raw.to_string()],
    }
}

/// Split a report into display paragraphs on blank lines.
pub fn paragraphs(report: &str) -> Vec<&str> {
    report
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Offline;

    impl AnalysisProvider for Offline {
        fn fetch_analysis(&self, _: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "offline"))
        }
        fn fetch_summary(&self, _: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::TimedOut, "offline"))
        }
        fn name(&self) -> &'static str {
            "offline"
        }
    }

    struct Empty;

    impl AnalysisProvider for Empty {
        fn fetch_analysis(&self, _: &str) -> io::Result<Option<String>> {
            Ok(None)
        }
        fn fetch_summary(&self, _: &str) -> io::Result<Option<String>> {
            Ok(None)
        }
        fn name(&self) -> &'static str {
            "empty"
        }
    }

    #[test]
    fn canned_returns_soap_note() {
        let text = analysis_or_placeholder(&CannedAnalysis, "M00001");
        assert!(text.starts_with("Subjective:"));
        assert_eq!(paragraphs(&text).len(), 4);
    }

    #[test]
    fn failures_become_placeholder() {
        assert_eq!(analysis_or_placeholder(&Offline, "M00001"), UNAVAILABLE_ANALYSIS);
        assert!(summary_steps(&Offline, "M00001").is_empty());
    }

    #[test]
    fn missing_analysis_placeholder() {
        assert_eq!(analysis_or_placeholder(&Empty, "M00001"), MISSING_ANALYSIS);
        assert!(summary_steps(&Empty, "M00001").is_empty());
    }

    #[test]
    fn canned_summary_has_three_steps() {
        let steps = summary_steps(&CannedAnalysis, "M00001");
        assert_eq!(steps.len(), 3);
        assert!(steps[0].starts_with("Systolic trend"));
    }

    #[test]
    fn parse_steps_from_json() {
        let steps = parse_summary_steps(r#"{"steps":[{"why":"a"},{"why":"b"},{"other":1}]}"#);
        assert_eq!(steps, vec!["a", "b"]);
    }

    #[test]
    fn parse_falls_back_to_raw_text() {
        assert_eq!(parse_summary_steps("plain text"), vec!["plain text"]);
        assert_eq!(parse_summary_steps(r#"{"note":"x"}"#), vec![r#"{"note":"x"}"#]);
    }

    #[test]
    fn paragraphs_skip_blank_blocks() {
        assert_eq!(paragraphs("a\n\n\n\nb\n"), vec!["a", "b"]);
    }
}
