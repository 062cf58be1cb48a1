//! One demo session: patient, scenario, vitals, and hospital-side state.
//!
//! Everything here is created at session start and thrown away on
//! [`Session::reset`]. Nothing in a session is persisted; the trial log in
//! [`crate::trial`] is the only thing written to disk.

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::orders::{Order, OrderBoard};
use crate::patient::Patient;
use crate::risk::RiskScore;
use crate::scenario::{Group, ScenarioController, ScenarioStep, UiGates};
use crate::trial::{TreatmentTimer, TrialRecord};
use crate::vitals::{VitalReading, Vitals};

/// Which screen is in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Paramedic,
    Hospital,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Paramedic => Self::Hospital,
            Self::Hospital => Self::Paramedic,
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paramedic => write!(f, "paramedic"),
            Self::Hospital => write!(f, "hospital"),
        }
    }
}

/// Mutable state of a running demo.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    patient: Patient,
    controller: ScenarioController,
    vitals: Vitals,
    view: ViewMode,
    incoming_transfer: bool,
    orders: OrderBoard,
    review: TreatmentTimer,
    ticks: u64,
}

impl Session {
    /// Fresh session with a randomly rolled group.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_controller(ScenarioController::new(rng))
    }

    /// Fresh session pinned to `group`.
    pub fn with_group(group: Group) -> Self {
        Self::from_controller(ScenarioController::with_group(group))
    }

    fn from_controller(controller: ScenarioController) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient: Patient::demo(),
            controller,
            vitals: Vitals::initial(),
            view: ViewMode::default(),
            incoming_transfer: false,
            orders: OrderBoard::default(),
            review: TreatmentTimer::default(),
            ticks: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn step(&self) -> ScenarioStep {
        self.controller.step()
    }

    pub fn group(&self) -> Group {
        self.controller.group()
    }

    pub fn gates(&self) -> UiGates {
        self.controller.gates()
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn incoming_transfer(&self) -> bool {
        self.incoming_transfer
    }

    pub fn orders(&self) -> &OrderBoard {
        &self.orders
    }

    pub fn review(&self) -> &TreatmentTimer {
        &self.review
    }

    /// Drift ticks applied since the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn risk(&self) -> RiskScore {
        RiskScore::from_vitals(&self.vitals)
    }

    pub fn advance(&mut self) -> ScenarioStep {
        self.controller.advance()
    }

    /// Discard all session state: step 0, new group, initial vitals,
    /// paramedic view, no transfer, no orders, no running review.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.controller.reset(rng);
        self.vitals = Vitals::initial();
        self.view = ViewMode::Paramedic;
        self.incoming_transfer = false;
        self.orders = OrderBoard::default();
        self.review.cancel();
        self.ticks = 0;
    }

    /// One drift tick. Returns `false` and leaves vitals untouched below the
    /// drift threshold.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.gates().telemetry_live {
            return false;
        }
        self.vitals.drift(rng);
        self.ticks += 1;
        log::debug!(
            "tick {}: BP {}/{} HR {}",
            self.ticks,
            self.vitals.systolic(),
            self.vitals
                .get(crate::vitals::VitalKind::Bp)
                .and_then(|s| s.sub_value)
                .unwrap_or_default(),
            self.vitals.heart_rate()
        );
        true
    }

    /// Send the record and depart. Only accepted once departure is enabled;
    /// moves a connected scenario to [`ScenarioStep::Departed`] and brings the
    /// hospital view forward.
    pub fn transfer(&mut self) -> bool {
        if !self.gates().depart_enabled {
            log::warn!("transfer rejected at step {}", self.step());
            return false;
        }
        if self.step() == ScenarioStep::Connected {
            self.controller.advance();
        }
        self.incoming_transfer = true;
        self.view = ViewMode::Hospital;
        true
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Toggle a clinical order, stamping activations with `time`.
    pub fn toggle_order(&mut self, order: Order, time: &str) -> bool {
        self.orders.toggle(order, time)
    }

    pub fn is_recommended(&self, order: Order) -> bool {
        order.is_recommended(self.group(), self.risk().raw)
    }

    /// Open the analysis review; starts the treatment timer.
    pub fn begin_review(&mut self) {
        self.review.begin();
    }

    pub fn cancel_review(&mut self) {
        self.review.cancel();
    }

    /// Close the review and produce a trial record, if one was running.
    pub fn complete_treatment(&mut self) -> Option<TrialRecord> {
        let secs = self.review.complete()?;
        Some(TrialRecord::local(&self.patient.id, self.group(), secs))
    }

    /// Read-only copy for rendering and serialisation.
    pub fn snapshot(&self) -> SessionSnapshot {
        let step = self.step();
        SessionSnapshot {
            session_id: self.id.to_string(),
            step: step.index(),
            step_name: step,
            step_label: step.label(),
            group: self.group(),
            patient: self.patient.clone(),
            view: self.view,
            incoming_transfer: self.incoming_transfer,
            gates: self.gates(),
            vitals: self.vitals.readings(),
            risk: self.risk(),
            ticks: self.ticks,
        }
    }
}

/// Serialisable snapshot of a [`Session`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub step: u8,
    pub step_name: ScenarioStep,
    pub step_label: &'static str,
    pub group: Group,
    pub patient: Patient,
    pub view: ViewMode,
    pub incoming_transfer: bool,
    pub gates: UiGates,
    pub vitals: Vec<VitalReading>,
    pub risk: RiskScore,
    pub ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn connected(group: Group) -> Session {
        let mut s = Session::with_group(group);
        for _ in 0..3 {
            s.advance();
        }
        s
    }

    #[test]
    fn ticks_below_threshold_do_nothing() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut s = Session::with_group(Group::A);
        for step in 0..3 {
            assert_eq!(s.step().index(), step);
            for _ in 0..50 {
                assert!(!s.tick(&mut rng));
            }
            assert_eq!(*s.vitals(), Vitals::initial());
            s.advance();
        }
        assert!(s.tick(&mut rng));
        assert_eq!(s.ticks(), 1);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut s = connected(Group::B);
        for _ in 0..20 {
            s.tick(&mut rng);
        }
        s.toggle_order(Order::Ekg, "09:00:00");
        s.begin_review();
        assert!(s.transfer());

        s.reset(&mut rng);
        assert_eq!(s.step(), ScenarioStep::Idle);
        assert_eq!(*s.vitals(), Vitals::initial());
        assert_eq!(s.view(), ViewMode::Paramedic);
        assert!(!s.incoming_transfer());
        assert!(s.orders().log().is_empty());
        assert!(!s.review().is_running());
        assert_eq!(s.ticks(), 0);
    }

    #[test]
    fn transfer_requires_connection() {
        let mut s = Session::with_group(Group::A);
        s.advance();
        s.advance();
        assert!(!s.transfer());
        assert_eq!(s.view(), ViewMode::Paramedic);

        s.advance();
        assert!(s.transfer());
        assert_eq!(s.step(), ScenarioStep::Departed);
        assert_eq!(s.view(), ViewMode::Hospital);
        assert!(s.incoming_transfer());

        // Already departed: accepted again, step unchanged.
        assert!(s.transfer());
        assert_eq!(s.step(), ScenarioStep::Departed);
    }

    #[test]
    fn vitals_keep_drifting_after_departure() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut s = connected(Group::A);
        s.transfer();
        assert!(s.tick(&mut rng));
    }

    #[test]
    fn complete_treatment_builds_record() {
        let mut s = Session::with_group(Group::B);
        assert!(s.complete_treatment().is_none());
        s.begin_review();
        let record = s.complete_treatment().unwrap();
        assert_eq!(record.patient_id, "M00001");
        assert_eq!(record.group, Group::B);
        assert!(!s.review().is_running());
    }

    #[test]
    fn recommendations_follow_group_and_risk() {
        let s = Session::with_group(Group::B);
        // Initial vitals: 80/120 * 40 = 26.7 > 22
        assert!(s.is_recommended(Order::BrainCt));
        let a = Session::with_group(Group::A);
        assert!(!a.is_recommended(Order::Abga));
    }

    #[test]
    fn snapshot_reflects_state() {
        let s = connected(Group::A);
        let snap = s.snapshot();
        assert_eq!(snap.step, 3);
        assert_eq!(snap.step_name, ScenarioStep::Connected);
        assert!(snap.gates.telemetry_live);
        assert_eq!(snap.vitals.len(), 5);
        assert_eq!(snap.risk.score_text(), "26.7");

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["group"], "A");
        assert_eq!(json["view"], "paramedic");
        assert_eq!(json["step_name"], "connected");
        assert_eq!(json["risk"]["level"], "Moderate");
        assert_eq!(json["vitals"][0]["sub_value"], "80");
    }
}
