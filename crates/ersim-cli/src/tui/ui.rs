//! TUI rendering: paramedic and hospital screens over one session.
//!
//! ┌──────────────────────────────────────────────┐
//! │  🚑 ersim   step 3/4 connected   group B     │
//! ├─────────────────────┬────────────────────────┤
//! │  Scenario           │  Vitals                │
//! │  ✓ scan ID          │  BP  132/84  mmHg      │
//! │  ✓ match hospital   │  HR  97      bpm       │
//! │  ● telemetry live   ├────────────────────────┤
//! │                     │  Risk 29.4 Moderate    │
//! │  Patient            │  ▁▂▃▅▆▅▄ trend         │
//! ├─────────────────────┴────────────────────────┤
//! │  status line                                 │
//! ├──────────────────────────────────────────────┤
//! │  n: next  t: transfer  v: view  x: reset ... │
//! └──────────────────────────────────────────────┘

use super::app::App;
use ersim_core::analysis::paragraphs;
use ersim_core::{RiskLevel, ScenarioStep, ViewMode, VitalReading, VitalStatus};
use ratatui::{prelude::*, widgets::*};

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(12),   // main
            Constraint::Length(3), // status
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    match app.snapshot().view {
        ViewMode::Paramedic => draw_paramedic(f, rows[1], app),
        ViewMode::Hospital => draw_hospital(f, rows[1], app),
    }
    draw_status(f, rows[2], app);
    draw_keys(f, rows[3], app.snapshot().view);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let s = app.snapshot();
    let live = if app.is_drifting() { " ● LIVE" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🚑 ersim ", Style::default().bold().fg(Color::Cyan)),
            Span::raw(format!("  {} view  ", s.view)),
            Span::styled(
                format!("step {}/4 {}", s.step, s.step_name),
                Style::default().bold().fg(Color::Yellow),
            ),
            Span::styled(format!("  group {}", s.group), Style::default().fg(Color::Magenta)),
            Span::styled(
                format!("  tick #{}{live} ", s.ticks),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

// ---------------------------------------------------------------------------
// Paramedic screen
// ---------------------------------------------------------------------------

fn draw_paramedic(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Min(4),
            Constraint::Length(6),
        ])
        .split(cols[0]);
    draw_steps(f, left[0], app);
    draw_patient(f, left[1], app);
    draw_trend(f, left[2], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(5)])
        .split(cols[1]);
    draw_vitals(f, right[0], app);
    draw_risk(f, right[1], app);
}

fn draw_steps(f: &mut Frame, area: Rect, app: &App) {
    let current = app.snapshot().step_name;
    let items: Vec<ListItem> = ScenarioStep::ALL
        .iter()
        .map(|&step| {
            let (marker, style) = if step < current {
                ("✓", Style::default().fg(Color::Green))
            } else if step == current {
                ("▸", Style::default().bold().fg(Color::Yellow))
            } else {
                (" ", Style::default().fg(Color::DarkGray))
            };
            ListItem::new(format!("{marker} {}. {}", step.index(), step.label())).style(style)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Scenario "));
    f.render_widget(list, area);
}

fn draw_patient(f: &mut Frame, area: Rect, app: &App) {
    let s = app.snapshot();
    let text = if s.gates.record_linked {
        let p = &s.patient;
        vec![
            Line::from(Span::styled(&p.name, Style::default().bold().fg(Color::Cyan))),
            Line::from(format!("{}  {}y {:?}  blood {}", p.id, p.age, p.gender, p.blood_type)),
            Line::from(""),
            Line::from(p.condition.as_str()),
        ]
    } else {
        vec![Line::from(Span::styled(
            "Scan the patient ID to link a record (n).",
            Style::default().fg(Color::DarkGray),
        ))]
    };

    let p = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Patient "));
    f.render_widget(p, area);
}

/// SBP and HR sparklines, one point per drift tick.
fn draw_trend(f: &mut Frame, area: Rect, app: &App) {
    let trend = app.trend();
    let block = Block::default().borders(Borders::ALL).title(" Trend ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(inner);

    for (row, label, data, color) in [
        (rows[0], "SBP", &trend.systolic, Color::Cyan),
        (rows[1], "HR ", &trend.heart_rate, Color::Magenta),
    ] {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(5), Constraint::Min(1)])
            .split(row);
        let last = data.back().map_or_else(|| "-".to_string(), u64::to_string);
        f.render_widget(
            Paragraph::new(vec![Line::from(label), Line::from(last)])
                .style(Style::default().fg(color)),
            cols[0],
        );
        let points: Vec<u64> = data.iter().copied().collect();
        f.render_widget(
            Sparkline::default()
                .data(&points)
                .style(Style::default().fg(color)),
            cols[1],
        );
    }
}

fn status_style(status: VitalStatus) -> Style {
    match status {
        VitalStatus::Normal => Style::default().fg(Color::Green),
        VitalStatus::Warning => Style::default().fg(Color::Yellow).bold(),
        VitalStatus::Critical => Style::default().fg(Color::Red).bold(),
    }
}

fn vital_row(v: &VitalReading) -> Row<'static> {
    let value = match &v.sub_value {
        Some(sub) => format!("{}/{sub}", v.value),
        None => v.value.clone(),
    };
    Row::new(vec![
        v.label.clone(),
        value,
        v.unit.clone(),
        format!("{:?}", v.status).to_lowercase(),
    ])
    .style(status_style(v.status))
}

fn draw_vitals(f: &mut Frame, area: Rect, app: &App) {
    let s = app.snapshot();
    let title = if s.gates.telemetry_live {
        " Vitals (live) "
    } else {
        " Vitals "
    };
    let rows: Vec<Row> = s.vitals.iter().map(vital_row).collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(9),
            Constraint::Length(6),
            Constraint::Min(8),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Stable => Color::Green,
        RiskLevel::Moderate => Color::Yellow,
        RiskLevel::HighCritical => Color::Red,
    }
}

fn draw_risk(f: &mut Frame, area: Rect, app: &App) {
    let risk = app.snapshot().risk;
    let color = risk_color(risk.level);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(vec![
            Span::raw(" Risk "),
            Span::styled(
                format!("{} {} ", risk.score_text(), risk.level),
                Style::default().bold().fg(color),
            ),
        ]));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let ratio = (risk.score / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(risk.score_text());
    f.render_widget(gauge, parts[0]);

    let data: Vec<u64> = app.trend().risk.iter().copied().collect();
    let spark = Sparkline::default()
        .data(&data)
        .style(Style::default().fg(color));
    f.render_widget(spark, parts[1]);
}

// ---------------------------------------------------------------------------
// Hospital screen
// ---------------------------------------------------------------------------

fn draw_hospital(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(cols[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(left[0]);
    draw_vitals(f, top[0], app);
    draw_risk(f, top[1], app);
    draw_analysis(f, left[1], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(4)])
        .split(cols[1]);
    draw_orders(f, right[0], app);
    draw_audit(f, right[1], app);
}

fn draw_analysis(f: &mut Frame, area: Rect, app: &App) {
    let s = app.snapshot();
    let mut lines: Vec<Line> = Vec::new();

    if s.incoming_transfer {
        lines.push(Line::from(Span::styled(
            format!("Incoming: {}", s.patient.short_tag()),
            Style::default().bold().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    let Some(clock) = app.review_clock() else {
        lines.push(Line::from(Span::styled(
            "Press s to open the AI analysis and start the treatment timer.",
            Style::default().fg(Color::DarkGray),
        )));
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Clinical analysis "));
        f.render_widget(p, area);
        return;
    };

    let summary = app.summary();
    if !summary.is_empty() {
        lines.push(Line::from(Span::styled(
            "AI summary",
            Style::default().bold().fg(Color::Magenta),
        )));
        for (i, why) in summary.iter().enumerate() {
            lines.push(Line::from(format!("{}. {why}", i + 1)));
        }
        lines.push(Line::from(""));
    }

    for para in paragraphs(app.report()) {
        for line in para.lines() {
            let style = if line.ends_with(':') {
                Style::default().bold().fg(Color::Cyan)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(line, style)));
        }
        lines.push(Line::from(""));
    }

    let title = format!(" Clinical analysis  ⏱ {clock} ");
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_orders(f: &mut Frame, area: Rect, app: &App) {
    let rows: Vec<Row> = app
        .orders()
        .into_iter()
        .map(|(key, order, active, recommended)| {
            let marker = if active { "●" } else { " " };
            let ai = if recommended { "AI" } else { "" };
            let style = if active {
                Style::default().fg(Color::Green).bold()
            } else if recommended {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default()
            };
            Row::new(vec![
                key.to_string(),
                marker.to_string(),
                order.label().to_string(),
                order.tag().to_string(),
                ai.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(18),
            Constraint::Length(7),
            Constraint::Length(3),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(" Orders "));
    f.render_widget(table, area);
}

fn draw_audit(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .audit_log()
        .into_iter()
        .map(|e| ListItem::new(format!("{}  {}", e.time, e.text)))
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(" Audit log "));
    f.render_widget(list, area);
}

// ---------------------------------------------------------------------------
// Footer
// ---------------------------------------------------------------------------

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().borders(Borders::ALL).title(" Status ");
    let p = Paragraph::new(app.status().unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .block(block);
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect, view: ViewMode) {
    let text = match view {
        ViewMode::Paramedic => " n: next step   t: transfer   v: hospital view   x: reset   q: quit",
        ViewMode::Hospital => {
            " 1-8: orders   s: review/complete   c: cancel   v: paramedic view   x: reset   q: quit"
        }
    };
    let bar = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
