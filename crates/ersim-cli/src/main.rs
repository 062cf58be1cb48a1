//! CLI for ersim: a scripted ambulance-to-hospital handover, live in your terminal.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ersim")]
#[command(about = "ersim: scripted emergency-response scenario simulator")]
#[command(version = ersim_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live paramedic / hospital dashboard (TUI)
    Monitor {
        /// Drift interval in milliseconds once telemetry is connected
        #[arg(long, default_value = "1000")]
        tick_ms: u64,

        /// Force the A/B group instead of rolling one (A or B)
        #[arg(long)]
        group: Option<String>,

        /// Directory for the A/B trial log (default: ./trials/)
        #[arg(long, default_value = "trials")]
        dir: String,
    },

    /// Headless run: print one JSON snapshot per drift tick
    Simulate {
        /// Number of ticks to run (0 = until Ctrl+C)
        #[arg(long, default_value = "10")]
        ticks: u64,

        /// Scenario step to start from (0-4). Drift needs step 3 or later.
        #[arg(long, default_value = "3")]
        start_step: u8,

        /// Seed for the drift walk and group roll
        #[arg(long)]
        seed: Option<u64>,

        /// Force the A/B group (A or B)
        #[arg(long)]
        group: Option<String>,

        /// Delay between ticks (e.g. "1s", "250ms"); default: no delay
        #[arg(long)]
        interval: Option<String>,

        /// Write JSON lines to a file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },

    /// Compute the shock-index risk score for a heart rate and systolic BP
    Risk {
        /// Heart rate (bpm)
        #[arg(long)]
        hr: f64,

        /// Systolic blood pressure (mmHg)
        #[arg(long)]
        sbp: f64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recorded A/B trial durations
    Trials {
        /// Directory containing ab_logs.jsonl (default: ./trials/)
        #[arg(long, default_value = "trials")]
        dir: String,
    },

    /// Start the HTTP scenario API
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8043")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Drift interval in milliseconds
        #[arg(long, default_value = "1000")]
        tick_ms: u64,

        /// Force the A/B group (A or B)
        #[arg(long)]
        group: Option<String>,

        /// Directory for the A/B trial log
        #[arg(long, default_value = "trials")]
        dir: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            tick_ms,
            group,
            dir,
        } => commands::monitor::run(tick_ms, group.as_deref(), &dir),
        Commands::Simulate {
            ticks,
            start_step,
            seed,
            group,
            interval,
            output,
        } => commands::simulate::run(commands::simulate::SimulateConfig {
            ticks,
            start_step,
            seed,
            group: group.as_deref(),
            interval: interval.as_deref(),
            output_path: output.as_deref(),
        }),
        Commands::Risk { hr, sbp, json } => commands::risk::run(hr, sbp, json),
        Commands::Trials { dir } => commands::trials::run(&dir),
        Commands::Server {
            port,
            host,
            tick_ms,
            group,
            dir,
        } => commands::server::run(&host, port, tick_ms, group.as_deref(), &dir),
    }
}
