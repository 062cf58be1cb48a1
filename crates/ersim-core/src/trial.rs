//! A/B trial timing and the local trial log.
//!
//! The hospital view times how long a clinician takes from opening the
//! analysis review to logging the treatment complete. Each completed review
//! is appended to `ab_logs.jsonl` in the log directory, one JSON record per
//! line. There is no remote sink, so every record is stored `LOCAL_ONLY`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::scenario::Group;

/// File name of the trial log inside its directory.
pub const LOG_FILE: &str = "ab_logs.jsonl";

// ---------------------------------------------------------------------------
// Treatment timer
// ---------------------------------------------------------------------------

/// Measures one review-to-completion interval.
#[derive(Debug, Clone, Default)]
pub struct TreatmentTimer {
    started: Option<Instant>,
}

impl TreatmentTimer {
    /// Start timing now. A running timer keeps its original start.
    pub fn begin(&mut self) {
        self.begin_at(Instant::now());
    }

    pub fn begin_at(&mut self, at: Instant) {
        if self.started.is_none() {
            self.started = Some(at);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Whole seconds since start, 0 when idle.
    pub fn elapsed_secs(&self) -> u64 {
        self.started.map_or(0, |s| s.elapsed().as_secs())
    }

    /// Stop and return whole elapsed seconds. `None` if not running.
    pub fn complete(&mut self) -> Option<u64> {
        self.complete_at(Instant::now())
    }

    pub fn complete_at(&mut self, at: Instant) -> Option<u64> {
        self.started
            .take()
            .map(|s| at.saturating_duration_since(s).as_secs())
    }

    /// Stop without producing a duration.
    pub fn cancel(&mut self) {
        self.started = None;
    }
}

/// `MM:SS` rendering of an elapsed review.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ---------------------------------------------------------------------------
// Trial records
// ---------------------------------------------------------------------------

/// Where a record was delivered. There is no remote sink, so every record is
/// written locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialStatus {
    LocalOnly,
}

/// One completed A/B trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub patient_id: String,
    pub group: Group,
    pub duration_secs: u64,
    pub status: TrialStatus,
    /// ISO-8601 UTC time the record was written.
    pub timestamp: String,
}

impl TrialRecord {
    pub fn local(patient_id: &str, group: Group, duration_secs: u64) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            group,
            duration_secs,
            status: TrialStatus::LocalOnly,
            timestamp: format_iso8601(
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Trial log
// ---------------------------------------------------------------------------

/// Append-only JSON-lines log of trial records.
#[derive(Debug, Clone)]
pub struct TrialLog {
    path: PathBuf,
}

impl TrialLog {
    /// Log inside `dir`, created on first append.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LOG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the directory and file as needed.
    pub fn append(&self, record: &TrialRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record).map_err(std::io::Error::other)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        log::info!(
            "trial logged: {} group {} {}s",
            record.patient_id,
            record.group,
            record.duration_secs
        );
        Ok(())
    }

    /// All readable records in file order. A missing file is an empty log.
    pub fn read_all(&self) -> std::io::Result<Vec<TrialRecord>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut records = Vec::new();
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TrialRecord>(&line) {
                Ok(r) => records.push(r),
                Err(e) => log::warn!(
                    "skipping malformed trial record at {}:{}: {e}",
                    self.path.display(),
                    lineno + 1
                ),
            }
        }
        Ok(records)
    }
}

/// Per-group count and mean duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: Group,
    pub trials: usize,
    pub mean_secs: f64,
}

pub fn summarize(records: &[TrialRecord]) -> Vec<GroupSummary> {
    [Group::A, Group::B]
        .into_iter()
        .map(|group| {
            let durations: Vec<u64> = records
                .iter()
                .filter(|r| r.group == group)
                .map(|r| r.duration_secs)
                .collect();
            let mean_secs = if durations.is_empty() {
                0.0
            } else {
                durations.iter().sum::<u64>() as f64 / durations.len() as f64
            };
            GroupSummary {
                group,
                trials: durations.len(),
                mean_secs,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a duration-since-epoch as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Seconds since Unix epoch to (year, month, day, hour, minute, second) UTC.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let month_lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1u64;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    (year, month, days + 1, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}
