//! `ersim server`: HTTP API over a live scenario session.

pub fn run(host: &str, port: u16, tick_ms: u64, group: Option<&str>, trial_dir: &str) {
    let session = super::make_session(group);
    let config = super::make_config(tick_ms, trial_dir);

    let base = format!("http://{host}:{port}");

    println!("🚑 ersim server v{}", ersim_core::VERSION);
    println!("   {base}");
    println!(
        "   patient {}  group {}  drift every {}ms",
        session.patient().short_tag(),
        session.group(),
        config.tick_interval.as_millis()
    );
    println!();
    println!("   Endpoints:");
    println!("     GET  /                  API index (try: curl {base})");
    println!("     GET  /scenario          Current scenario snapshot");
    println!("     POST /scenario/advance  Advance one step");
    println!("     POST /scenario/reset    Back to step 0, new A/B group");
    println!("     POST /transfer          Send record and depart");
    println!("     GET  /vitals            Vital signs");
    println!("     GET  /risk              Risk score");
    println!("     GET  /analysis          AI clinical analysis (starts treatment timer)");
    println!("     GET  /orders            Clinical orders and audit log");
    println!("     POST /orders/<order>    Toggle an order (e.g. brain_ct)");
    println!("     POST /review/begin      Start treatment timer");
    println!("     POST /review/complete   Stop timer, log A/B trial");
    println!("     GET  /health            Health check");
    println!();
    println!("   Trial log: {}", config.trial_dir.join(ersim_core::trial::LOG_FILE).display());
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error starting runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(ersim_server::run_server(session, config, host, port)) {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
