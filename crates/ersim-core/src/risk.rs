//! Shock-index style severity score.
//!
//! `score = (HR / SBP) * 40`, clamped high to 99.9 and then low to 5.0.

use serde::Serialize;

use crate::vitals::Vitals;

pub const SCALE: f64 = 40.0;
pub const SCORE_CEILING: f64 = 99.9;
pub const SCORE_FLOOR: f64 = 5.0;
pub const MODERATE_ABOVE: f64 = 22.0;
pub const CRITICAL_ABOVE: f64 = 32.0;

/// Severity band of a [`RiskScore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Stable,
    Moderate,
    #[serde(rename = "High Critical")]
    HighCritical,
}

impl RiskLevel {
    pub fn classify(score: f64) -> Self {
        if score > CRITICAL_ABOVE {
            Self::HighCritical
        } else if score > MODERATE_ABOVE {
            Self::Moderate
        } else {
            Self::Stable
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "Stable"),
            Self::Moderate => write!(f, "Moderate"),
            Self::HighCritical => write!(f, "High Critical"),
        }
    }
}

/// Derived risk score; recomputed from vitals, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskScore {
    /// Unclamped `(HR / SBP) * 40`.
    pub raw: f64,
    /// Clamped score in `[5.0, 99.9]`.
    pub score: f64,
    pub level: RiskLevel,
}

impl RiskScore {
    /// Score from heart rate and systolic pressure.
    ///
    /// A non-finite ratio (zero systolic) saturates at the ceiling.
    pub fn compute(heart_rate: f64, systolic: f64) -> Self {
        let mut raw = (heart_rate / systolic) * SCALE;
        if !raw.is_finite() {
            raw = f64::INFINITY;
        }
        let mut score = raw;
        if score > SCORE_CEILING {
            score = SCORE_CEILING;
        }
        if score < SCORE_FLOOR {
            score = SCORE_FLOOR;
        }
        Self {
            raw,
            score,
            level: RiskLevel::classify(score),
        }
    }

    pub fn from_vitals(vitals: &Vitals) -> Self {
        Self::compute(vitals.heart_rate(), vitals.systolic())
    }

    /// Score with one decimal, e.g. `"26.7"`.
    pub fn score_text(&self) -> String {
        format!("{:.1}", self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalKind;

    #[test]
    fn moderate_example() {
        let r = RiskScore::compute(80.0, 120.0);
        assert_eq!(r.score_text(), "26.7");
        assert_eq!(r.level, RiskLevel::Moderate);
    }

    #[test]
    fn high_critical_example() {
        let r = RiskScore::compute(120.0, 90.0);
        assert_eq!(r.score_text(), "53.3");
        assert_eq!(r.level, RiskLevel::HighCritical);
        assert_eq!(r.raw, r.score);
    }

    #[test]
    fn floor_applies_near_zero() {
        let r = RiskScore::compute(1.0, 200.0);
        assert!(r.raw < SCORE_FLOOR);
        assert_eq!(r.score, SCORE_FLOOR);
        assert_eq!(r.level, RiskLevel::Stable);
    }

    #[test]
    fn ceiling_applies() {
        let r = RiskScore::compute(300.0, 50.0);
        assert_eq!(r.score, SCORE_CEILING);
        assert_eq!(r.level, RiskLevel::HighCritical);
    }

    #[test]
    fn zero_systolic_saturates() {
        let r = RiskScore::compute(80.0, 0.0);
        assert_eq!(r.score, SCORE_CEILING);
        let r = RiskScore::compute(0.0, 0.0);
        assert_eq!(r.score, SCORE_CEILING);
    }

    #[test]
    fn band_edges_are_exclusive() {
        assert_eq!(RiskLevel::classify(22.0), RiskLevel::Stable);
        assert_eq!(RiskLevel::classify(22.01), RiskLevel::Moderate);
        assert_eq!(RiskLevel::classify(32.0), RiskLevel::Moderate);
        assert_eq!(RiskLevel::classify(32.01), RiskLevel::HighCritical);
    }

    #[test]
    fn from_vitals_uses_hr_and_sbp() {
        let mut v = Vitals::initial();
        assert_eq!(RiskScore::from_vitals(&v).score_text(), "26.7");
        v.get_mut(VitalKind::Hr).unwrap().value = 110.0;
        v.get_mut(VitalKind::Bp).unwrap().value = 115.0;
        let r = RiskScore::from_vitals(&v);
        assert_eq!(r.score_text(), "38.3");
        assert_eq!(r.level, RiskLevel::HighCritical);
    }

    #[test]
    fn level_display() {
        assert_eq!(RiskLevel::HighCritical.to_string(), "High Critical");
        assert_eq!(RiskLevel::Stable.to_string(), "Stable");
    }
}
