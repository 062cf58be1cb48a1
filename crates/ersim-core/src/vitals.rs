//! Vital signs and the bounded random walk that drifts them.
//!
//! Five signs exist per session (BP, HR, SpO2, BT, RR). Once telemetry is
//! connected each tick nudges every field independently:
//!
//! | field        | step            | clamp      | rounding |
//! |--------------|-----------------|------------|----------|
//! | BP systolic  | U[-1.5, 1.5]    | [115, 145] | integer  |
//! | BP diastolic | U[-1.5, 1.5]    | [75, 95]   | integer  |
//! | HR           | U[-1.5, 1.5]    | [75, 115]  | integer  |
//! | SpO2         | U[-1.5, 1.5]    | [94, 99]   | integer  |
//! | RR           | U[-1.5, 1.5]    | [14, 24]   | integer  |
//! | BT           | U[-0.05, 0.05]  | none       | 0.1      |
//!
//! BP and HR statuses are recomputed from the new values; the other statuses
//! are left as they are.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half-width of the integer-field walk.
pub const WALK_STEP: f64 = 1.5;
/// Half-width of the body-temperature walk.
pub const TEMP_STEP: f64 = 0.05;

pub const SYSTOLIC_RANGE: (f64, f64) = (115.0, 145.0);
pub const DIASTOLIC_RANGE: (f64, f64) = (75.0, 95.0);
pub const HR_RANGE: (f64, f64) = (75.0, 115.0);
pub const SPO2_RANGE: (f64, f64) = (94.0, 99.0);
pub const RR_RANGE: (f64, f64) = (14.0, 24.0);

/// Systolic pressure above which BP is flagged.
pub const SYSTOLIC_WARNING: f64 = 140.0;
/// Heart rate above which HR is flagged.
pub const HR_WARNING: f64 = 100.0;

/// Which measurement a [`VitalSign`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalKind {
    Bp,
    Hr,
    SpO2,
    Bt,
    Rr,
}

impl VitalKind {
    /// Display order used by both views.
    pub const ALL: [VitalKind; 5] = [Self::Bp, Self::Hr, Self::SpO2, Self::Bt, Self::Rr];

    pub fn label(self) -> &'static str {
        match self {
            Self::Bp => "BP",
            Self::Hr => "HR",
            Self::SpO2 => "SpO2",
            Self::Bt => "BT",
            Self::Rr => "RR",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Bp => "mmHg",
            Self::Hr => "bpm",
            Self::SpO2 => "%",
            Self::Bt => "°C",
            Self::Rr => "/min",
        }
    }

    /// Decimal places used when rendering the value.
    pub fn precision(self) -> usize {
        match self {
            Self::Bt => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for VitalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity classification of a single sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VitalStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl std::fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One physiological measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct VitalSign {
    pub kind: VitalKind,
    pub value: f64,
    /// Diastolic pressure for BP; `None` for every other sign.
    pub sub_value: Option<f64>,
    pub status: VitalStatus,
}

impl VitalSign {
    pub fn new(kind: VitalKind, value: f64) -> Self {
        Self {
            kind,
            value,
            sub_value: None,
            status: VitalStatus::Normal,
        }
    }

    pub fn with_sub_value(mut self, sub: f64) -> Self {
        self.sub_value = Some(sub);
        self
    }

    /// Value rendered at the kind's precision, e.g. `"120"` or `"36.5"`.
    pub fn value_text(&self) -> String {
        format!("{:.*}", self.kind.precision(), self.value)
    }

    pub fn sub_value_text(&self) -> Option<String> {
        self.sub_value
            .map(|v| format!("{:.*}", self.kind.precision(), v))
    }

    /// Render-ready copy with string values.
    pub fn reading(&self) -> VitalReading {
        VitalReading {
            label: self.kind.label().to_string(),
            value: self.value_text(),
            unit: self.kind.unit().to_string(),
            sub_value: self.sub_value_text(),
            status: self.status,
        }
    }
}

/// Serialisable view of a [`VitalSign`], values as display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub label: String,
    pub value: String,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_value: Option<String>,
    pub status: VitalStatus,
}

/// The five signs of a session, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Vitals {
    signs: Vec<VitalSign>,
}

impl Default for Vitals {
    fn default() -> Self {
        Self::initial()
    }
}

impl Vitals {
    /// Fixed starting values: BP 120/80, HR 80, SpO2 98, BT 36.5, RR 16.
    pub fn initial() -> Self {
        Self {
            signs: vec![
                VitalSign::new(VitalKind::Bp, 120.0).with_sub_value(80.0),
                VitalSign::new(VitalKind::Hr, 80.0),
                VitalSign::new(VitalKind::SpO2, 98.0),
                VitalSign::new(VitalKind::Bt, 36.5),
                VitalSign::new(VitalKind::Rr, 16.0),
            ],
        }
    }

    pub fn get(&self, kind: VitalKind) -> Option<&VitalSign> {
        self.signs.iter().find(|s| s.kind == kind)
    }

    pub fn get_mut(&mut self, kind: VitalKind) -> Option<&mut VitalSign> {
        self.signs.iter_mut().find(|s| s.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VitalSign> {
        self.signs.iter()
    }

    /// Current systolic pressure, 120 if BP is missing.
    pub fn systolic(&self) -> f64 {
        self.get(VitalKind::Bp).map_or(120.0, |s| s.value)
    }

    /// Current heart rate, 80 if HR is missing.
    pub fn heart_rate(&self) -> f64 {
        self.get(VitalKind::Hr).map_or(80.0, |s| s.value)
    }

    pub fn readings(&self) -> Vec<VitalReading> {
        self.signs.iter().map(VitalSign::reading).collect()
    }

    /// Apply one random-walk step to every sign.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        drift_vitals(&mut self.signs, rng);
    }
}

/// Integer-field walk: uniform step, clamp, round.
fn walk<R: Rng + ?Sized>(rng: &mut R, current: f64, (min, max): (f64, f64)) -> f64 {
    let change = rng.random_range(-WALK_STEP..=WALK_STEP);
    (current + change).clamp(min, max).round()
}

/// Temperature walk: small uniform step, unclamped, one decimal.
fn walk_temperature<R: Rng + ?Sized>(rng: &mut R, current: f64) -> f64 {
    let change = rng.random_range(-TEMP_STEP..=TEMP_STEP);
    ((current + change) * 10.0).round() / 10.0
}

fn threshold_status(value: f64, warning_above: f64) -> VitalStatus {
    if value > warning_above {
        VitalStatus::Warning
    } else {
        VitalStatus::Normal
    }
}

/// One drift tick over an arbitrary slice of signs.
///
/// Each field draws its own step; there is no correlation between fields or
/// memory between ticks beyond the current values.
pub fn drift_vitals<R: Rng + ?Sized>(signs: &mut [VitalSign], rng: &mut R) {
    for sign in signs.iter_mut() {
        match sign.kind {
            VitalKind::Bp => {
                sign.value = walk(rng, sign.value, SYSTOLIC_RANGE);
                let diastolic = sign.sub_value.unwrap_or(80.0);
                sign.sub_value = Some(walk(rng, diastolic, DIASTOLIC_RANGE));
                sign.status = threshold_status(sign.value, SYSTOLIC_WARNING);
            }
            VitalKind::Hr => {
                sign.value = walk(rng, sign.value, HR_RANGE);
                sign.status = threshold_status(sign.value, HR_WARNING);
            }
            VitalKind::SpO2 => sign.value = walk(rng, sign.value, SPO2_RANGE),
            VitalKind::Rr => sign.value = walk(rng, sign.value, RR_RANGE),
            VitalKind::Bt => sign.value = walk_temperature(rng, sign.value),
        }
    }
}
