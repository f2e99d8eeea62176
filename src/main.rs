use std::rc::Rc;

use capture_cycles::prelude::*;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

/// Wire self-capturing callback chains, drop every external handle and show
/// which models are reclaimed.
#[derive(StructOpt, Debug)]
#[structopt(name = "leak-demo")]
struct Cli {
  /// Break the cycles of leaked models after reporting them.
  #[structopt(long)]
  reclaim: bool,

  /// Strategies to run, one model each, with ids A, B, ..., Z, AA, ... Without any, runs
  /// all five in the documented order.
  /// [possible values: strong-self, single-guard, guard-all, weak-self, nested-function]
  strategies: Vec<CaptureStrategy>,
}

fn plan(strategies: &[CaptureStrategy]) -> Vec<(String, CaptureStrategy)> {
  if strategies.is_empty() {
    return DOCUMENTED_PLAN.iter().map(|(id, s)| (id.to_string(), *s)).collect();
  }
  strategies.iter().enumerate().map(|(index, s)| (sequential_id(index), *s)).collect()
}

fn main() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .try_init();

  let cli = Cli::from_args();
  let plan = plan(&cli.strategies);
  let plan: Vec<(&str, CaptureStrategy)> = plan.iter().map(|(id, s)| (id.as_str(), *s)).collect();

  let mut driver = Driver::new(Rc::new(Console));
  let leaks = driver.run(&plan);
  for leak in &leaks {
    tracing::warn!(
      id = %leak.id,
      strategy = %leak.strategy,
      strong_count = leak.strong_count,
      "model outlived its last external handle"
    );
  }

  if cli.reclaim {
    let reclaimed = driver.reclaim();
    tracing::info!(reclaimed, "reclaimed leaked models");
  }
}
