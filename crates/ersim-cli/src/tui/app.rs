//! TUI application state and event loop.
//!
//! The session lives behind a [`LiveSession`]; its drift thread mutates vitals
//! while this loop only reads snapshots and forwards key presses as scenario
//! actions.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use ersim_core::orders::now_clock;
use ersim_core::trial::format_elapsed;
use ersim_core::{
    CannedAnalysis, Group, LiveSession, Order, Session, SessionSnapshot, SimConfig, TrialLog,
    ViewMode, analysis_or_placeholder, summary_steps,
};

/// Points kept for the vitals trend sparklines.
const HISTORY_LEN: usize = 120;

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Rolling HR / SBP / risk history, one point per drift tick.
#[derive(Debug, Default)]
pub struct Trend {
    last_tick: u64,
    pub heart_rate: VecDeque<u64>,
    pub systolic: VecDeque<u64>,
    pub risk: VecDeque<u64>,
}

impl Trend {
    /// Record the snapshot if it carries a tick we have not seen yet.
    fn observe(&mut self, hr: f64, sbp: f64, risk: f64, ticks: u64) {
        if ticks < self.last_tick {
            *self = Self::default();
        }
        if ticks == self.last_tick {
            return;
        }
        self.last_tick = ticks;
        for (buf, v) in [
            (&mut self.heart_rate, hr),
            (&mut self.systolic, sbp),
            (&mut self.risk, risk),
        ] {
            buf.push_back(v.round().max(0.0) as u64);
            if buf.len() > HISTORY_LEN {
                buf.pop_front();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    live: LiveSession,
    trials: TrialLog,
    snapshot: SessionSnapshot,
    trend: Trend,
    report: String,
    summary: Vec<String>,
    /// Last treatment result or action feedback.
    status: Option<String>,
    running: bool,
}

impl App {
    pub fn new(session: Session, config: &SimConfig) -> Self {
        let patient_id = session.patient().id.clone();
        let report = analysis_or_placeholder(&CannedAnalysis, &patient_id);
        let summary = summary_steps(&CannedAnalysis, &patient_id);
        let live = LiveSession::new(session, config);
        let snapshot = live.snapshot();
        Self {
            live,
            trials: TrialLog::in_dir(&config.trial_dir),
            snapshot,
            trend: Trend::default(),
            report,
            summary,
            status: None,
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before the panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        if let Some(status) = &self.status {
            println!("{status}");
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            self.refresh();
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }

        Ok(())
    }

    /// Pull a fresh snapshot from the live session.
    fn refresh(&mut self) {
        let (hr, sbp) = {
            let session = self.live.lock();
            self.snapshot = session.snapshot();
            (session.vitals().heart_rate(), session.vitals().systolic())
        };
        let s = &self.snapshot;
        self.trend.observe(hr, sbp, s.risk.score, s.ticks);
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('n') => {
                let step = self.live.advance();
                self.status = Some(format!("Step {}: {}", step.index(), step.label()));
            }
            KeyCode::Char('t') => {
                self.status = Some(if self.live.transfer() {
                    "Record sent. Patient departed for hospital.".to_string()
                } else {
                    "Transfer needs telemetry connected (step 3).".to_string()
                });
            }
            KeyCode::Char('v') => {
                let mut session = self.live.lock();
                let view = session.view().toggled();
                session.set_view(view);
            }
            KeyCode::Char('x') => {
                self.live.reset();
                self.trend = Trend::default();
                let group = self.live.lock().group();
                self.status = Some(format!("Scenario reset. Group {group}."));
            }
            KeyCode::Char(c @ '1'..='8') => {
                if self.snapshot.view != ViewMode::Hospital {
                    return;
                }
                let slot = c as usize - '1' as usize;
                let order = Order::ALL[slot];
                self.live.lock().toggle_order(order, &now_clock());
            }
            KeyCode::Char('s') => self.review_key(),
            KeyCode::Char('c') => {
                self.live.lock().cancel_review();
                self.status = Some("Review closed.".to_string());
            }
            _ => {}
        }
        self.refresh();
    }

    /// `s` opens the review on the hospital screen, or completes treatment if
    /// a review is already running.
    fn review_key(&mut self) {
        if self.snapshot.view != ViewMode::Hospital {
            return;
        }
        let record = {
            let mut session = self.live.lock();
            if !session.review().is_running() {
                session.begin_review();
                return;
            }
            session.complete_treatment()
        };
        let Some(record) = record else {
            return;
        };
        let elapsed = format_elapsed(record.duration_secs);
        self.status = Some(match self.trials.append(&record) {
            Ok(()) => format!(
                "Treatment complete in {elapsed} (group {}), logged to {}",
                record.group,
                self.trials.path().display()
            ),
            Err(e) => format!("Treatment complete in {elapsed}; trial log failed: {e}"),
        });
    }

    // -----------------------------------------------------------------------
    // Accessors for ui.rs
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    pub fn trend(&self) -> &Trend {
        &self.trend
    }

    pub fn report(&self) -> &str {
        &self.report
    }

    /// Summary steps, shown to group B only.
    pub fn summary(&self) -> &[String] {
        match self.snapshot.group {
            Group::A => &[],
            Group::B => &self.summary,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_drifting(&self) -> bool {
        self.live.is_drifting()
    }

    /// Order rows: (hotkey, order, active, recommended).
    pub fn orders(&self) -> Vec<(char, Order, bool, bool)> {
        let session = self.live.lock();
        Order::ALL
            .into_iter()
            .zip('1'..='8')
            .map(|(o, key)| {
                (
                    key,
                    o,
                    session.orders().is_active(o),
                    session.is_recommended(o),
                )
            })
            .collect()
    }

    pub fn audit_log(&self) -> Vec<ersim_core::AuditEntry> {
        self.live.lock().orders().log().to_vec()
    }

    /// Treatment timer text while a review is open.
    pub fn review_clock(&self) -> Option<String> {
        let session = self.live.lock();
        let review = session.review();
        review
            .is_running()
            .then(|| format_elapsed(review.elapsed_secs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ersim_core::ScenarioStep;

    fn app(group: Group, dir: &std::path::Path) -> App {
        let config = SimConfig {
            tick_interval: Duration::from_millis(5),
            trial_dir: dir.to_path_buf(),
        };
        App::new(Session::with_group(group), &config)
    }

    #[test]
    fn keys_walk_the_scenario() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(Group::A, tmp.path());

        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.snapshot().step, 0);

        for _ in 0..3 {
            app.handle_key(KeyCode::Char('n'));
        }
        assert_eq!(app.snapshot().step_name, ScenarioStep::Connected);
        assert!(app.is_drifting());

        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.snapshot().step, 4);
        assert_eq!(app.snapshot().view, ViewMode::Hospital);

        app.handle_key(KeyCode::Char('x'));
        assert_eq!(app.snapshot().step, 0);
        assert!(!app.is_drifting());
        assert_eq!(app.snapshot().view, ViewMode::Paramedic);
    }

    #[test]
    fn orders_only_from_hospital_view() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(Group::B, tmp.path());

        app.handle_key(KeyCode::Char('1'));
        assert!(app.audit_log().is_empty());

        app.handle_key(KeyCode::Char('v'));
        app.handle_key(KeyCode::Char('1'));
        assert_eq!(app.audit_log().len(), 1);
        let rows = app.orders();
        assert!(rows[0].2);
        assert!(rows[0].3);
    }

    #[test]
    fn review_writes_trial_record() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(Group::B, tmp.path());
        app.handle_key(KeyCode::Char('v'));

        app.handle_key(KeyCode::Char('s'));
        assert!(app.review_clock().is_some());
        app.handle_key(KeyCode::Char('s'));
        assert!(app.review_clock().is_none());
        assert!(app.status().unwrap().contains("group B"));

        let records = TrialLog::in_dir(tmp.path()).read_all().unwrap();
        assert_eq!(records.len(), 1);
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(200, 60)).unwrap();
        terminal.draw(|f| super::super::ui::draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn analysis_shown_only_while_review_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = app(Group::B, tmp.path());
        app.handle_key(KeyCode::Char('v'));

        let before = screen(&app);
        assert!(app.review_clock().is_none());
        assert!(!before.contains("Subjective:"));
        assert!(!before.contains("AI summary"));
        assert!(before.contains("Press s to open the AI analysis"));

        app.handle_key(KeyCode::Char('s'));
        let during = screen(&app);
        assert!(during.contains("Subjective:"));
        assert!(during.contains("AI summary"));

        app.handle_key(KeyCode::Char('s'));
        assert!(!screen(&app).contains("Subjective:"));
    }

    #[test]
    fn paramedic_screen_shows_trend_panel() {
        let tmp = tempfile::tempdir().unwrap();
        let app = app(Group::A, tmp.path());
        let text = screen(&app);
        assert!(text.contains("Trend"));
        assert!(text.contains("SBP"));
    }

    #[test]
    fn summary_hidden_for_group_a() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(app(Group::A, tmp.path()).summary().is_empty());
        assert_eq!(app(Group::B, tmp.path()).summary().len(), 3);
    }

    #[test]
    fn trend_resets_when_ticks_go_back() {
        let mut t = Trend::default();
        t.observe(80.0, 120.0, 26.7, 1);
        t.observe(82.0, 121.0, 27.1, 2);
        t.observe(82.0, 121.0, 27.1, 2);
        assert_eq!(t.heart_rate.len(), 2);
        t.observe(80.0, 120.0, 26.7, 0);
        assert!(t.heart_rate.is_empty());
    }
}
