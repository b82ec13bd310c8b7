use std::path::PathBuf;

use anyhow::Result;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use groupby_results_arrow::{batch::results_to_batch, extract_experiment, ExtractConfig};

/// Extracts every `>>> run=<trial>, <attribute>=<value>` line of an experiment's logs into
/// `results/<experiment_id>.parquet`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
  /// Experiment to extract; selects `logs/<id>/*/*.log` and names the output file
  #[arg(long, short = 'e', visible_alias = "eid")]
  experiment_id: String,
  #[arg(long, default_value = "logs", help = "Directory holding one folder per experiment")]
  logs_dir: PathBuf,
  #[arg(long, default_value = "results", help = "Directory the parquet file is written to")]
  results_dir: PathBuf,
  #[arg(long, default_value_t = 20, help = "Rows of the merged table to print")]
  preview: usize,
  #[arg(long, short, help = "Log at debug level")]
  verbose: bool,
}

fn main() -> Result<()> {
  let args = Args::parse();

  let log_level = if args.verbose { "debug" } else { "info" };
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
  log::debug!("{args:?}");

  let config = ExtractConfig {
    exp_id: args.experiment_id,
    logs_dir: args.logs_dir,
    results_dir: args.results_dir,
  };
  let (table, summary) = extract_experiment(&config)?;

  if !summary.empty_files.is_empty() {
    log::warn!(
      "{} of {} log files had no results",
      summary.empty_files.len(),
      summary.files
    );
  }

  let batch = results_to_batch(&table)?;
  let shown = args.preview.min(batch.num_rows());
  println!("{}", pretty_format_batches(&[batch.slice(0, shown)])?);
  if shown < batch.num_rows() {
    println!("... {} more rows", batch.num_rows() - shown);
  }
  println!(
    "parsed {} files ({} rows), combined into {}",
    summary.merged,
    summary.rows,
    summary.output.display()
  );

  Ok(())
}
