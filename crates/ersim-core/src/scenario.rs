//! Scenario controller for the simulated patient-transfer workflow.
//!
//! The workflow is a fixed five-stage ladder:
//!
//! ```text
//! Idle → Identified → Matched → Connected → Departed
//!  0         1           2          3          4
//! ```
//!
//! [`ScenarioController::advance`] climbs one rung at a time and saturates at
//! [`ScenarioStep::Departed`]. Only [`ScenarioController::reset`] moves back
//! down. Which UI controls are enabled is derived from the step through
//! [`UiGates`] rather than stored.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Step at which telemetry connects and vitals begin to drift.
pub const DRIFT_THRESHOLD: ScenarioStep = ScenarioStep::Connected;

/// Discrete stage of the simulated transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Awaiting the identification scan.
    #[default]
    Idle,
    /// Patient identified, record linked.
    Identified,
    /// Hospital match found.
    Matched,
    /// Telemetry connected, vitals drifting.
    Connected,
    /// Patient record transferred, ambulance departed.
    Departed,
}

impl ScenarioStep {
    /// All steps in workflow order.
    pub const ALL: [ScenarioStep; 5] = [
        Self::Idle,
        Self::Identified,
        Self::Matched,
        Self::Connected,
        Self::Departed,
    ];

    /// Numeric index in `0..=4`.
    pub fn index(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Identified => 1,
            Self::Matched => 2,
            Self::Connected => 3,
            Self::Departed => 4,
        }
    }

    /// Inverse of [`ScenarioStep::index`]. Out-of-range values yield `None`.
    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.get(i as usize).copied()
    }

    /// Transition table. `None` at the terminal step.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Identified),
            Self::Identified => Some(Self::Matched),
            Self::Matched => Some(Self::Connected),
            Self::Connected => Some(Self::Departed),
            Self::Departed => None,
        }
    }

    /// Short operator-facing description of the stage.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Awaiting ID scan",
            Self::Identified => "Patient identified",
            Self::Matched => "Hospital matched",
            Self::Connected => "Telemetry connected",
            Self::Departed => "Transferred",
        }
    }

    /// Whether the drift generator runs at this step.
    pub fn drifts(self) -> bool {
        self >= DRIFT_THRESHOLD
    }
}

impl std::fmt::Display for ScenarioStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Identified => write!(f, "identified"),
            Self::Matched => write!(f, "matched"),
            Self::Connected => write!(f, "connected"),
            Self::Departed => write!(f, "departed"),
        }
    }
}

/// A/B test arm assigned to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    /// Uniform coin flip between the two arms.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.random_bool(0.5) { Self::A } else { Self::B }
    }

    /// Parse `"A"`/`"B"` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Self::A),
            "B" | "b" => Some(Self::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// UI enablement derived from the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiGates {
    /// The identification scan button is shown.
    pub scan_enabled: bool,
    /// The patient record is linked ("DB Connected").
    pub record_linked: bool,
    /// Automatic hospital matching can be started.
    pub match_enabled: bool,
    /// Telemetry connection can be established.
    pub connect_enabled: bool,
    /// Live vitals are streaming.
    pub telemetry_live: bool,
    /// Transfer-and-depart is available.
    pub depart_enabled: bool,
    /// The workflow has reached its terminal step.
    pub departed: bool,
}

impl UiGates {
    pub fn for_step(step: ScenarioStep) -> Self {
        Self {
            scan_enabled: step == ScenarioStep::Idle,
            record_linked: step >= ScenarioStep::Identified,
            match_enabled: step == ScenarioStep::Identified,
            connect_enabled: step == ScenarioStep::Matched,
            telemetry_live: step.drifts(),
            depart_enabled: step >= ScenarioStep::Connected,
            departed: step == ScenarioStep::Departed,
        }
    }
}

/// Step counter plus the session's A/B group.
#[derive(Debug, Clone)]
pub struct ScenarioController {
    step: ScenarioStep,
    group: Group,
}

impl ScenarioController {
    /// Start at [`ScenarioStep::Idle`] with a randomly rolled group.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_group(Group::roll(rng))
    }

    /// Start at [`ScenarioStep::Idle`] with a fixed group.
    pub fn with_group(group: Group) -> Self {
        Self {
            step: ScenarioStep::Idle,
            group,
        }
    }

    pub fn step(&self) -> ScenarioStep {
        self.step
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn gates(&self) -> UiGates {
        UiGates::for_step(self.step)
    }

    /// Move one step forward. A no-op at [`ScenarioStep::Departed`].
    pub fn advance(&mut self) -> ScenarioStep {
        if let Some(next) = self.step.next() {
            log::info!("scenario advanced: {} -> {}", self.step, next);
            self.step = next;
        }
        self.step
    }

    /// Back to [`ScenarioStep::Idle`] with a freshly rolled group.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.step = ScenarioStep::Idle;
        self.group = Group::roll(rng);
        log::info!("scenario reset, group {}", self.group);
    }
}
