use std::path::PathBuf;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use groupby_results_arrow::{
  batch::{aggregated_to_batch, speedup_to_batch},
  results_path,
};
use groupby_results_core::SpeedupTable;
use groupby_results_eval::{build_report, load_results, render_report, ReportConfig, SvgReport};

/// Summarises `results/<experiment_id>.parquet` and draws latency and speedup charts next to it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Experiment to report on
  #[arg(long, short = 'e', visible_alias = "eid")]
  experiment_id: String,
  #[arg(
    long,
    default_value = "results",
    help = "Directory holding the parquet file; charts go here too"
  )]
  results_dir: PathBuf,
  #[arg(
    long = "exclude-algorithm",
    default_value = "sequential",
    help = "Algorithm left out of every view; repeatable"
  )]
  excluded_algorithms: Vec<String>,
  #[arg(long, short, help = "Log at debug level")]
  verbose: bool,
}

fn print_speedup(title: &str, table: &SpeedupTable) -> Result<()> {
  println!("{title} ({}):", table.attribute);
  println!("{}", pretty_format_batches(&[speedup_to_batch(table)?])?);
  if table.missing_baselines > 0 {
    log::warn!(
      "{}: {} rows have no single-thread baseline",
      title,
      table.missing_baselines
    );
  }
  Ok(())
}

fn main() -> Result<()> {
  let args = Args::parse();

  let log_level = if args.verbose { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
  log::debug!("{args:?}");

  let path = results_path(&args.results_dir, &args.experiment_id);
  let runtime = tokio::runtime::Builder::new_current_thread()
    .build()
    .context("start runtime")?;
  let table = runtime.block_on(load_results(&path))?;
  log::info!("loaded {} rows from {}", table.len(), path.display());

  let config = ReportConfig {
    excluded_algorithms: args.excluded_algorithms,
    ..ReportConfig::default()
  };
  let report = build_report(&table, &config);

  for duplicate in &report.duplicates {
    log::warn!(
      "trial {} of {} {},{},{},np{} on {} appears {} times",
      duplicate.trial_id,
      duplicate.attribute,
      duplicate.identity.distribution,
      duplicate.identity.size_config,
      duplicate.identity.algorithm,
      duplicate.identity.thread_count,
      duplicate.identity.machine_id,
      duplicate.occurrences
    );
  }

  println!("{}", pretty_format_batches(&[aggregated_to_batch(&report.aggregated)?])?);
  print_speedup("out-of-box speedup", &report.oob_speedup)?;
  print_speedup("aggregation speedup", &report.agg_speedup)?;

  let mut sink = SvgReport::new(&args.results_dir, &args.experiment_id);
  for written in render_report(&report, &mut sink)? {
    println!("wrote {}", written.display());
  }

  Ok(())
}
