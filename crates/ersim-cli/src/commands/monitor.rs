pub fn run(tick_ms: u64, group: Option<&str>, trial_dir: &str) {
    let session = super::make_session(group);
    let config = super::make_config(tick_ms, trial_dir);
    let mut app = crate::tui::app::App::new(session, &config);
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
