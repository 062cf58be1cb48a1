//! HTTP API over a live scenario session.
//!
//! One [`LiveSession`] is shared by every handler. Scenario actions go through
//! it so the drift timer starts at `Connected` and stops on reset; read
//! endpoints return snapshots.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Mutex;

use ersim_core::orders::now_clock;
use ersim_core::{
    AnalysisProvider, CannedAnalysis, Group, LiveSession, Order, RiskScore, Session,
    SessionSnapshot, SimConfig, TrialLog, TrialRecord, VitalReading, analysis_or_placeholder,
    summary_steps,
};

/// Shared server state.
pub struct AppState {
    live: Mutex<LiveSession>,
    analysis: Box<dyn AnalysisProvider>,
    trials: TrialLog,
}

impl AppState {
    pub fn new(session: Session, config: &SimConfig) -> Self {
        Self {
            live: Mutex::new(LiveSession::new(session, config)),
            analysis: Box::new(CannedAnalysis),
            trials: TrialLog::in_dir(&config.trial_dir),
        }
    }
}

#[derive(Serialize)]
struct ActionResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    scenario: SessionSnapshot,
}

#[derive(Serialize)]
struct VitalsResponse {
    telemetry_live: bool,
    ticks: u64,
    vitals: Vec<VitalReading>,
}

#[derive(Serialize)]
struct RiskResponse {
    score: String,
    level: String,
    raw: f64,
    heart_rate: f64,
    systolic: f64,
}

#[derive(Serialize)]
struct AnalysisResponse {
    patient_id: String,
    group: Group,
    report: String,
    /// Only populated for group B.
    summary_steps: Vec<String>,
    /// Treatment timer, started by the first analysis read.
    review_secs: u64,
}

#[derive(Serialize)]
struct OrderEntry {
    order: &'static str,
    label: &'static str,
    tag: &'static str,
    active: bool,
    recommended: bool,
}

#[derive(Serialize)]
struct OrdersResponse {
    orders: Vec<OrderEntry>,
    log: Vec<ersim_core::AuditEntry>,
}

#[derive(Serialize)]
struct TreatmentResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<TrialRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    step: u8,
    drifting: bool,
}

fn ok(scenario: SessionSnapshot) -> (StatusCode, Json<ActionResponse>) {
    (
        StatusCode::OK,
        Json(ActionResponse {
            success: true,
            error: None,
            scenario,
        }),
    )
}

async fn handle_scenario(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.live.lock().await.snapshot())
}

async fn handle_advance(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ActionResponse>) {
    let mut live = state.live.lock().await;
    live.advance();
    ok(live.snapshot())
}

async fn handle_reset(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ActionResponse>) {
    let mut live = state.live.lock().await;
    // Join the drift thread on the blocking pool, not on a runtime worker.
    if let Some(timer) = live.take_timer()
        && let Err(e) = tokio::task::spawn_blocking(move || timer.stop()).await
    {
        log::warn!("drift timer join failed: {e}");
    }
    live.reset();
    ok(live.snapshot())
}

async fn handle_transfer(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ActionResponse>) {
    let mut live = state.live.lock().await;
    if live.transfer() {
        return ok(live.snapshot());
    }
    let scenario = live.snapshot();
    (
        StatusCode::CONFLICT,
        Json(ActionResponse {
            success: false,
            error: Some(format!(
                "Transfer is available from step 3; scenario is at step {} ({}).",
                scenario.step, scenario.step_label
            )),
            scenario,
        }),
    )
}

async fn handle_vitals(State(state): State<Arc<AppState>>) -> Json<VitalsResponse> {
    let live = state.live.lock().await;
    let session = live.lock();
    Json(VitalsResponse {
        telemetry_live: session.gates().telemetry_live,
        ticks: session.ticks(),
        vitals: session.vitals().readings(),
    })
}

async fn handle_risk(State(state): State<Arc<AppState>>) -> Json<RiskResponse> {
    let live = state.live.lock().await;
    let session = live.lock();
    let risk: RiskScore = session.risk();
    Json(RiskResponse {
        score: risk.score_text(),
        level: risk.level.to_string(),
        raw: risk.raw,
        heart_rate: session.vitals().heart_rate(),
        systolic: session.vitals().systolic(),
    })
}

/// Reading the analysis opens the review, so the treatment timer measures
/// from first sight of the report. Later reads keep the running timer.
async fn handle_analysis(State(state): State<Arc<AppState>>) -> Json<AnalysisResponse> {
    let (patient_id, group, review_secs) = {
        let live = state.live.lock().await;
        let mut session = live.lock();
        session.begin_review();
        (
            session.patient().id.clone(),
            session.group(),
            session.review().elapsed_secs(),
        )
    };
    let report = analysis_or_placeholder(state.analysis.as_ref(), &patient_id);
    let steps = match group {
        Group::B => summary_steps(state.analysis.as_ref(), &patient_id),
        Group::A => Vec::new(),
    };
    Json(AnalysisResponse {
        patient_id,
        group,
        report,
        summary_steps: steps,
        review_secs,
    })
}

fn orders_of(session: &Session) -> OrdersResponse {
    OrdersResponse {
        orders: Order::ALL
            .into_iter()
            .map(|o| OrderEntry {
                order: o.slug(),
                label: o.label(),
                tag: o.tag(),
                active: session.orders().is_active(o),
                recommended: session.is_recommended(o),
            })
            .collect(),
        log: session.orders().log().to_vec(),
    }
}

async fn handle_orders(State(state): State<Arc<AppState>>) -> Json<OrdersResponse> {
    let live = state.live.lock().await;
    let session = live.lock();
    Json(orders_of(&session))
}

async fn handle_toggle_order(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<OrdersResponse>, (StatusCode, Json<serde_json::Value>)> {
    let Some(order) = Order::from_slug(&name) else {
        let known: Vec<&str> = Order::ALL.iter().map(|o| o.slug()).collect();
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Unknown order: {name}. Known orders: {}", known.join(", ")),
            })),
        ));
    };
    let live = state.live.lock().await;
    let mut session = live.lock();
    session.toggle_order(order, &now_clock());
    Ok(Json(orders_of(&session)))
}

async fn handle_begin_review(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let live = state.live.lock().await;
    let mut session = live.lock();
    session.begin_review();
    Json(serde_json::json!({
        "success": true,
        "elapsed_secs": session.review().elapsed_secs(),
    }))
}

async fn handle_complete_review(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<TreatmentResponse>) {
    let record = {
        let live = state.live.lock().await;
        let mut session = live.lock();
        session.complete_treatment()
    };
    let Some(record) = record else {
        return (
            StatusCode::CONFLICT,
            Json(TreatmentResponse {
                success: false,
                record: None,
                error: Some("No review in progress.".to_string()),
            }),
        );
    };
    // The trial log is best-effort; the treatment still completes.
    let error = match state.trials.append(&record) {
        Ok(()) => None,
        Err(e) => {
            log::warn!("trial log write failed: {e}");
            Some(format!("Trial log unavailable: {e}"))
        }
    };
    (
        StatusCode::OK,
        Json(TreatmentResponse {
            success: true,
            record: Some(record),
            error,
        }),
    )
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let live = state.live.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        step: live.lock().step().index(),
        drifting: live.is_drifting(),
    })
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.live.lock().await.snapshot();

    Json(serde_json::json!({
        "name": "ersim server",
        "version": ersim_core::VERSION,
        "session": snapshot.session_id,
        "patient": snapshot.patient.id,
        "group": snapshot.group,
        "endpoints": {
            "/": "This API index",
            "/scenario": "GET current scenario snapshot",
            "/scenario/advance": "POST advance one step (saturates at 4)",
            "/scenario/reset": "POST reset to step 0 with a new A/B group",
            "/transfer": "POST send record and depart (step 3 or later)",
            "/vitals": "GET current vital signs",
            "/risk": "GET shock-index risk score",
            "/analysis": "GET AI clinical analysis; starts the treatment timer (summary steps for group B)",
            "/orders": "GET clinical orders and audit log",
            "/orders/{order}": "POST toggle an order",
            "/review/begin": "POST start the treatment timer",
            "/review/complete": "POST stop the timer and log the A/B trial",
            "/health": "Health check",
        },
    }))
}

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/scenario", get(handle_scenario))
        .route("/scenario/advance", post(handle_advance))
        .route("/scenario/reset", post(handle_reset))
        .route("/transfer", post(handle_transfer))
        .route("/vitals", get(handle_vitals))
        .route("/risk", get(handle_risk))
        .route("/analysis", get(handle_analysis))
        .route("/orders", get(handle_orders))
        .route("/orders/{order}", post(handle_toggle_order))
        .route("/review/begin", post(handle_begin_review))
        .route("/review/complete", post(handle_complete_review))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the listener fails.
pub async fn run_server(
    session: Session,
    config: SimConfig,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let state = Arc::new(AppState::new(session, &config));
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn state(group: Group) -> Arc<AppState> {
        let config = SimConfig {
            tick_interval: Duration::from_millis(5),
            trial_dir: std::env::temp_dir().join(format!("ersim-test-{}", std::process::id())),
        };
        Arc::new(AppState::new(Session::with_group(group), &config))
    }

    #[tokio::test]
    async fn advance_saturates() {
        let st = state(Group::A);
        for _ in 0..6 {
            let (code, _) = handle_advance(State(Arc::clone(&st))).await;
            assert_eq!(code, StatusCode::OK);
        }
        let Json(snap) = handle_scenario(State(Arc::clone(&st))).await;
        assert_eq!(snap.step, 4);
    }

    #[tokio::test]
    async fn transfer_conflicts_before_connect() {
        let st = state(Group::A);
        let (code, Json(body)) = handle_transfer(State(Arc::clone(&st))).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert!(!body.success);
        assert!(body.error.is_some());

        for _ in 0..3 {
            handle_advance(State(Arc::clone(&st))).await;
        }
        let (code, Json(body)) = handle_transfer(State(Arc::clone(&st))).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.scenario.step, 4);
        assert!(body.scenario.incoming_transfer);
    }

    #[tokio::test]
    async fn reset_stops_drift() {
        let st = state(Group::B);
        for _ in 0..3 {
            handle_advance(State(Arc::clone(&st))).await;
        }
        let Json(h) = handle_health(State(Arc::clone(&st))).await;
        assert!(h.drifting);

        let (_, Json(body)) = handle_reset(State(Arc::clone(&st))).await;
        assert_eq!(body.scenario.step, 0);
        let Json(h) = handle_health(State(Arc::clone(&st))).await;
        assert!(!h.drifting);
    }

    #[tokio::test]
    async fn risk_on_initial_vitals() {
        let st = state(Group::A);
        let Json(r) = handle_risk(State(st)).await;
        assert_eq!(r.score, "26.7");
        assert_eq!(r.level, "Moderate");
    }

    #[tokio::test]
    async fn analysis_summary_only_for_group_b() {
        let Json(a) = handle_analysis(State(state(Group::A))).await;
        assert!(a.summary_steps.is_empty());
        assert!(!a.report.is_empty());
        let Json(b) = handle_analysis(State(state(Group::B))).await;
        assert_eq!(b.summary_steps.len(), 3);
    }

    #[tokio::test]
    async fn analysis_read_opens_review() {
        let st = state(Group::B);
        let (code, _) = handle_complete_review(State(Arc::clone(&st))).await;
        assert_eq!(code, StatusCode::CONFLICT);

        let Json(a) = handle_analysis(State(Arc::clone(&st))).await;
        assert_eq!(a.review_secs, 0);
        let Json(again) = handle_analysis(State(Arc::clone(&st))).await;
        assert_eq!(again.report, a.report);

        let (code, Json(body)) = handle_complete_review(State(st)).await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.record.unwrap().group, Group::B);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let st = state(Group::A);
        let err = handle_toggle_order(State(Arc::clone(&st)), Path("aspirin".to_string()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let Json(orders) = handle_toggle_order(State(st), Path("ekg".to_string()))
            .await
            .unwrap();
        assert!(orders.orders.iter().any(|o| o.order == "ekg" && o.active));
        assert_eq!(orders.log.len(), 1);
    }

    #[tokio::test]
    async fn complete_without_review_conflicts() {
        let st = state(Group::A);
        let (code, Json(body)) = handle_complete_review(State(st)).await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert!(body.record.is_none());
    }
}
