//! Command-line entry point: load a scenario, run it to completion,
//! print a summary.
//!
//! Grounded on `callisto::main`'s `main()` shape (init logging, then
//! drive the simulated system) — restructured around `clap::Parser`
//! since this core has no server loop to bind a socket for.

use std::process::ExitCode;

use clap::Parser;
use log::error;

use defense_sim::config::ScenarioFile;
use defense_sim::engine::Engine;
use defense_sim::scenario::Scenario;

/// Run a deterministic missile-defense simulation scenario to completion.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
  /// Path to the scenario JSON document.
  #[arg(long)]
  scenario: String,

  /// Stop after this many ticks even if the scenario hasn't terminated
  /// naturally. Defaults to the scenario's own `t_max_s`.
  #[arg(long)]
  max_ticks: Option<u64>,

  /// Suppress per-tick report lines; print only the final summary.
  #[arg(long, default_value_t = false)]
  quiet: bool,
}

fn main() -> ExitCode {
  pretty_env_logger::init();

  let args = Args::parse();

  let scenario_file = match ScenarioFile::load_from_file(&args.scenario) {
    Ok(f) => f,
    Err(e) => {
      error!("failed to load scenario {}: {e}", args.scenario);
      return ExitCode::FAILURE;
    }
  };

  let mut scenario = match Scenario::from_file(&scenario_file) {
    Ok(s) => s,
    Err(e) => {
      error!("invalid scenario: {e}");
      return ExitCode::FAILURE;
    }
  };

  if let Some(max_ticks) = args.max_ticks {
    scenario.t_max_ticks = scenario.t_max_ticks.min(max_ticks);
  }

  let mut engine = Engine::new(scenario);
  let reports = engine.run();

  let mut total_hits = 0;
  let mut total_kills = 0;
  let mut total_breakthroughs = 0;
  for report in &reports {
    total_hits += report.hits.len();
    total_kills += report.killed_targets.len();
    total_breakthroughs += report.broken_through_targets.len();
    if !args.quiet && (!report.hits.is_empty() || !report.killed_targets.is_empty() || !report.broken_through_targets.is_empty()) {
      println!(
        "tick {}: {} hits, {} killed, {} broken through, {} launches",
        report.tick,
        report.hits.len(),
        report.killed_targets.len(),
        report.broken_through_targets.len(),
        report.launches.len()
      );
    }
  }

  println!(
    "run complete after {} ticks: {total_hits} hits, {total_kills} killed, {total_breakthroughs} broken through",
    reports.len()
  );

  ExitCode::SUCCESS
}
