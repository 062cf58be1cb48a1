//! # ersim-core
//!
//! **Scenario engine for a scripted emergency-response dashboard.**
//!
//! A paramedic screen and a hospital screen share one simulated patient. This
//! crate holds everything those screens render from:
//!
//! - [`ScenarioController`]: a five-step workflow ladder
//!   (`Idle → Identified → Matched → Connected → Departed`) with an A/B group.
//! - [`Vitals`]: five vital signs and the bounded random walk that drifts them
//!   once telemetry is connected.
//! - [`RiskScore`]: a shock-index style severity score derived from HR and SBP.
//! - [`LiveSession`]: a [`Session`] bound to a [`DriftTimer`] that ticks every
//!   second while the scenario is at or past `Connected`.
//!
//! ## Quick Start
//!
//! ```
//! use ersim_core::{Group, ScenarioStep, Session};
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(1);
//! let mut session = Session::with_group(Group::A);
//!
//! // Below the threshold, ticks are ignored.
//! assert!(!session.tick(&mut rng));
//!
//! for _ in 0..3 {
//!     session.advance();
//! }
//! assert_eq!(session.step(), ScenarioStep::Connected);
//! assert!(session.tick(&mut rng));
//!
//! let risk = session.risk();
//! println!("risk {} ({})", risk.score_text(), risk.level);
//! ```

pub mod analysis;
pub mod config;
pub mod drift;
pub mod orders;
pub mod patient;
pub mod risk;
pub mod scenario;
pub mod session;
pub mod trial;
pub mod vitals;

pub use analysis::{
    AnalysisProvider, CannedAnalysis, analysis_or_placeholder, parse_summary_steps,
    summary_steps,
};
pub use config::SimConfig;
pub use drift::{DriftTimer, LiveSession, SharedSession};
pub use orders::{AuditEntry, Order, OrderBoard};
pub use patient::{Gender, Patient};
pub use risk::{RiskLevel, RiskScore};
pub use scenario::{DRIFT_THRESHOLD, Group, ScenarioController, ScenarioStep, UiGates};
pub use session::{Session, SessionSnapshot, ViewMode};
pub use trial::{TreatmentTimer, TrialLog, TrialRecord, TrialStatus};
pub use vitals::{VitalKind, VitalReading, VitalSign, VitalStatus, Vitals, drift_vitals};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
