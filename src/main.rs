use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;

use timefield::clock::ManualClock;
use timefield::config::{ControlConfig, load_control_config};
use timefield::group::TimeFieldGroup;
use timefield::logging::{LoggingConfig, init_logging};
use timefield::replay::{parse_baseline, parse_script, print_report, run_replay};
use timefield::ui;

#[derive(Parser, Debug)]
#[command(
    name = "timefield",
    version,
    about = "Segmented hour/minute/second entry control"
)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    replay: Option<String>,

    #[arg(long)]
    baseline: Option<String>,

    #[arg(long)]
    json: bool,

    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig {
        filter: cli.log_level.clone(),
        ..LoggingConfig::default()
    });

    let config = match &cli.config {
        Some(path) => load_control_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ControlConfig::default(),
    };
    let baseline = cli.baseline.as_deref().map(parse_baseline).transpose()?;

    let Some(script) = cli.replay.as_deref() else {
        return ui::app::run_gui(config, baseline);
    };

    let steps = parse_script(script)?;
    let baseline = baseline.unwrap_or_else(Local::now);
    let clock = ManualClock::new(baseline);
    let mut group = TimeFieldGroup::new(&config, baseline)?;
    let report = run_replay(&mut group, &clock, &steps)?;
    print_report(&report, cli.json)
}
