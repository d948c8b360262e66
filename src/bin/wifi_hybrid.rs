use clap::{ArgAction, Parser};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use wlansim_rs::scenario::{Scenario, ScenarioConfig, ScenarioError};

#[derive(Debug, Parser)]
#[command(
    name = "wifi-hybrid",
    about = "Run the point-to-point + CSMA + Wi-Fi hybrid scenario"
)]
struct Args {
    /// Log per-packet TX/RX lines from the applications
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    verbose: bool,

    /// Enable pcap capture on the p2p ends, the AP and the first CSMA device
    #[arg(long, action = ArgAction::Set, default_value_t = false)]
    tracing: bool,

    /// Scenario JSON; command-line flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of Wi-Fi stations
    #[arg(long)]
    n_wifi: Option<usize>,

    /// Number of extra CSMA nodes behind the router
    #[arg(long)]
    n_csma: Option<usize>,

    /// Minimum contention window advertised by the AP
    #[arg(long)]
    cw_min: Option<u32>,

    /// UDP payload size in bytes
    #[arg(long)]
    packet_size: Option<u32>,

    /// Directory for pcap files
    #[arg(long)]
    pcap_dir: Option<PathBuf>,

    /// Seed for the backoff RNG
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run report as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<ScenarioConfig, ScenarioError> {
    let mut cfg = match &args.config {
        Some(path) => ScenarioConfig::from_json_file(path)?,
        None => ScenarioConfig::default(),
    };
    cfg.verbose = args.verbose;
    cfg.tracing = args.tracing;
    if let Some(n) = args.n_wifi {
        cfg.n_wifi = n;
    }
    if let Some(n) = args.n_csma {
        cfg.n_csma = n;
    }
    if let Some(cw) = args.cw_min {
        cfg.cw_min = cw;
    }
    if let Some(size) = args.packet_size {
        cfg.packet_size = size;
    }
    if let Some(dir) = &args.pcap_dir {
        cfg.pcap_dir = dir.clone();
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    Ok(cfg)
}

fn run(args: &Args) -> Result<(), ScenarioError> {
    let cfg = load_config(args)?;
    let report = Scenario::new(cfg).run()?;
    println!("{}", report.summary_line());

    if let Some(path) = &args.report_json {
        let raw = serde_json::to_string_pretty(&report)?;
        fs::write(path, raw)?;
        eprintln!("wrote report to {}", path.display());
    }
    for pcap in &report.captures {
        info!(path = %pcap.display(), "pcap written");
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "scenario failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
