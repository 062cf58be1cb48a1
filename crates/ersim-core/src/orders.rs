//! Hospital clinical orders and the audit log they feed.
//!
//! Activating an order prepends an acknowledgement to the audit log;
//! deactivating it is silent. Group B sessions surface AI-recommended orders.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::scenario::Group;

/// Raw risk above which a Brain CT is recommended to group B.
pub const CT_RECOMMEND_ABOVE: f64 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Abga,
    BrainCt,
    Ekg,
    ChestXray,
    IvFluid,
    Oxygen,
    Epinephrine,
    Intubation,
}

impl Order {
    pub const ALL: [Order; 8] = [
        Self::Abga,
        Self::BrainCt,
        Self::Ekg,
        Self::ChestXray,
        Self::IvFluid,
        Self::Oxygen,
        Self::Epinephrine,
        Self::Intubation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Abga => "Arterial blood gas (ABGA)",
            Self::BrainCt => "Brain CT",
            Self::Ekg => "12-lead EKG",
            Self::ChestXray => "Chest X-ray",
            Self::IvFluid => "IV fluid (N/S 1L)",
            Self::Oxygen => "Oxygen 4L (nasal)",
            Self::Epinephrine => "Epinephrine",
            Self::Intubation => "Endotracheal intubation",
        }
    }

    /// Category tag shown under the label.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Abga => "LAB",
            Self::BrainCt => "IMG",
            Self::Ekg => "EKG",
            Self::ChestXray => "X-RAY",
            Self::IvFluid => "FLUID",
            Self::Oxygen => "O2",
            Self::Epinephrine => "DRUG",
            Self::Intubation => "AIRWAY",
        }
    }

    /// Audit-log text written when the order is placed.
    pub fn log_text(self) -> &'static str {
        match self {
            Self::Abga => "Lab: arterial blood gas analysis (ABGA) ordered",
            Self::BrainCt => "Imaging: Brain CT (non-contrast) scheduled",
            Self::Ekg => "Test: 12-lead EKG monitoring started",
            Self::ChestXray => "Imaging: portable chest X-ray (AP) requested",
            Self::IvFluid => "Treatment: N/S 0.9% 1L IV line secured and running",
            Self::Oxygen => "Treatment: O2 4L/min via nasal cannula",
            Self::Epinephrine => "Drug: epinephrine 1mg IV bolus (CODE BLUE)",
            Self::Intubation => "Procedure: endotracheal intubation set prepared",
        }
    }

    /// Stable identifier used on the wire, e.g. `"brain_ct"`.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Abga => "abga",
            Self::BrainCt => "brain_ct",
            Self::Ekg => "ekg",
            Self::ChestXray => "chest_xray",
            Self::IvFluid => "iv_fluid",
            Self::Oxygen => "oxygen",
            Self::Epinephrine => "epinephrine",
            Self::Intubation => "intubation",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.slug() == s)
    }

    fn slot(self) -> usize {
        Self::ALL.iter().position(|o| *o == self).unwrap_or(0)
    }

    /// Whether the order is highlighted as AI-recommended.
    pub fn is_recommended(self, group: Group, raw_risk: f64) -> bool {
        match group {
            Group::A => false,
            Group::B => match self {
                Self::Abga | Self::IvFluid => true,
                Self::BrainCt => raw_risk > CT_RECOMMEND_ABOVE,
                _ => false,
            },
        }
    }
}

/// One acknowledged order in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// Wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub text: String,
}

/// Active/inactive state of every order plus the newest-first audit log.
#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    active: [bool; 8],
    log: Vec<AuditEntry>,
}

impl OrderBoard {
    pub fn is_active(&self, order: Order) -> bool {
        self.active[order.slot()]
    }

    /// Flip an order. Returns the new active state.
    ///
    /// `time` is the `HH:MM:SS` stamp recorded if the order becomes active.
    pub fn toggle(&mut self, order: Order, time: &str) -> bool {
        let slot = order.slot();
        self.active[slot] = !self.active[slot];
        if self.active[slot] {
            self.log.insert(
                0,
                AuditEntry {
                    time: time.to_string(),
                    text: order.log_text().to_string(),
                },
            );
        }
        self.active[slot]
    }

    /// Audit entries, newest first.
    pub fn log(&self) -> &[AuditEntry] {
        &self.log
    }

    pub fn active_orders(&self) -> Vec<Order> {
        Order::ALL
            .into_iter()
            .filter(|o| self.is_active(*o))
            .collect()
    }
}

/// Current UTC wall-clock time as `HH:MM:SS`.
pub fn now_clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    clock_text(secs)
}

/// Time of day of `secs` (taken modulo one day) as `HH:MM:SS`.
pub fn clock_text(secs: u64) -> String {
    let secs = secs % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60
    )
}
