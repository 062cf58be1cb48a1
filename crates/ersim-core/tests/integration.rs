//! Integration tests for ersim-core.
//!
//! These walk a whole demo session end to end:
//! scan → identify → match → connect (drift) → transfer → review → trial log.

use std::thread;
use std::time::Duration;

use ersim_core::{
    CannedAnalysis, Group, LiveSession, Order, RiskLevel, ScenarioStep, Session, SimConfig,
    TrialLog, ViewMode, VitalKind, VitalStatus, Vitals, analysis_or_placeholder, summary_steps,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn full_walkthrough_with_manual_ticks() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut session = Session::with_group(Group::B);

    let mut steps = Vec::new();
    for _ in 0..6 {
        steps.push(session.advance());
    }
    assert_eq!(
        steps,
        [
            ScenarioStep::Identified,
            ScenarioStep::Matched,
            ScenarioStep::Connected,
            ScenarioStep::Departed,
            ScenarioStep::Departed,
            ScenarioStep::Departed,
        ]
    );

    for _ in 0..1000 {
        assert!(session.tick(&mut rng));
        let v = session.vitals();
        let bp = v.get(VitalKind::Bp).unwrap();
        assert!((115.0..=145.0).contains(&bp.value));
        assert!((75.0..=95.0).contains(&bp.sub_value.unwrap()));
        assert!((75.0..=115.0).contains(&v.heart_rate()));
        assert!((94.0..=99.0).contains(&v.get(VitalKind::SpO2).unwrap().value));
        assert!((14.0..=24.0).contains(&v.get(VitalKind::Rr).unwrap().value));
        assert_eq!(bp.status == VitalStatus::Warning, bp.value > 140.0);

        let risk = session.risk();
        assert!(risk.score >= 5.0 && risk.score <= 99.9);
        assert_eq!(risk.level, RiskLevel::classify(risk.score));
    }
}

#[test]
fn reset_mid_drift_restores_fixture() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut session = Session::new(&mut rng);
    for _ in 0..3 {
        session.advance();
    }
    for _ in 0..30 {
        session.tick(&mut rng);
    }
    session.reset(&mut rng);
    assert_eq!(session.step(), ScenarioStep::Idle);
    assert!(matches!(session.group(), Group::A | Group::B));
    assert_eq!(*session.vitals(), Vitals::initial());
    assert!(!session.tick(&mut rng));
}

#[test]
fn hospital_review_writes_trial_log() {
    let tmp = tempfile::tempdir().unwrap();
    let log = TrialLog::in_dir(tmp.path());

    let mut session = Session::with_group(Group::B);
    for _ in 0..3 {
        session.advance();
    }
    assert!(session.transfer());
    assert_eq!(session.view(), ViewMode::Hospital);

    let report = analysis_or_placeholder(&CannedAnalysis, &session.patient().id);
    assert!(report.contains("Assessment"));
    assert_eq!(summary_steps(&CannedAnalysis, &session.patient().id).len(), 3);

    assert!(session.is_recommended(Order::IvFluid));
    session.toggle_order(Order::IvFluid, "10:42:00");
    assert_eq!(session.orders().log().len(), 1);

    session.begin_review();
    let record = session.complete_treatment().unwrap();
    log.append(&record).unwrap();

    let records = log.read_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].group, Group::B);
    assert_eq!(records[0].patient_id, "M00001");
}

#[test]
fn live_session_drifts_only_when_connected() {
    let config = SimConfig::with_tick_ms(5);
    let mut live = LiveSession::new(Session::with_group(Group::A), &config);

    live.advance();
    live.advance();
    thread::sleep(Duration::from_millis(40));
    assert_eq!(live.snapshot().ticks, 0);

    live.advance();
    thread::sleep(Duration::from_millis(100));
    assert!(live.snapshot().ticks > 0);

    assert!(live.transfer());
    assert_eq!(live.snapshot().step, 4);
    assert!(live.is_drifting());

    live.reset();
    assert!(!live.is_drifting());
    let snap = live.snapshot();
    assert_eq!(snap.step, 0);
    assert_eq!(snap.ticks, 0);
}
