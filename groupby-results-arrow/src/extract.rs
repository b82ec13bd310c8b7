//! Discover the logs of one experiment, parse them in parallel and merge the results into a
//! single persisted table.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use glob::Pattern;
use groupby_results_core::{parse_log, LogFileIdentity, MeasurementRecord, ResultTable};
use log::{info, warn};
use rayon::prelude::*;

use crate::store::{results_path, write_results};

/// Extension of benchmark log files.
pub const LOG_EXTENSION: &str = "log";

#[derive(Debug, Clone)]
pub struct ExtractConfig {
  pub exp_id: String,
  /// Holds one directory per experiment, each with one directory per machine.
  pub logs_dir: PathBuf,
  pub results_dir: PathBuf,
}

impl ExtractConfig {
  /// Configuration with the conventional `logs/` and `results/` directories.
  pub fn new(exp_id: impl Into<String>) -> Self {
    ExtractConfig {
      exp_id: exp_id.into(),
      logs_dir: PathBuf::from("logs"),
      results_dir: PathBuf::from("results"),
    }
  }

  /// `<logs_dir>/<exp_id>/*/*.log`
  pub fn log_pattern(&self) -> Result<String> {
    let logs_dir = self
      .logs_dir
      .to_str()
      .ok_or_else(|| anyhow!("logs directory {} is not UTF-8", self.logs_dir.display()))?;
    Ok(format!(
      "{}/{}/*/*.{LOG_EXTENSION}",
      Pattern::escape(logs_dir),
      Pattern::escape(&self.exp_id)
    ))
  }

  pub fn output_path(&self) -> PathBuf {
    results_path(&self.results_dir, &self.exp_id)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractSummary {
  pub output: PathBuf,
  /// Every log file discovered.
  pub files: usize,
  /// Files that contributed at least one row.
  pub merged: usize,
  /// Files without a single result line, most likely runs still in progress.
  pub empty_files: Vec<PathBuf>,
  pub rows: usize,
}

/// All log files of the experiment, sorted by path.
pub fn discover_logs(config: &ExtractConfig) -> Result<Vec<PathBuf>> {
  let pattern = config.log_pattern()?;
  let mut paths = glob::glob(&pattern)
    .with_context(|| format!("bad log pattern {pattern}"))?
    .collect::<Result<Vec<_>, _>>()
    .with_context(|| format!("list {pattern}"))?;
  paths.retain(|path| path.is_file());
  paths.sort();
  Ok(paths)
}

/// Decode the identity of `path` and parse its result lines. The file is read in full and
/// closed before parsing starts.
pub fn parse_log_file(exp_id: &str, path: &Path) -> Result<Vec<MeasurementRecord>> {
  let identity =
    LogFileIdentity::from_path(path).with_context(|| format!("identify {}", path.display()))?;
  let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
  parse_log(exp_id, &identity, &text).with_context(|| format!("parse {}", path.display()))
}

/// Parse `paths` in parallel and merge every non-empty record set, keeping the order of
/// `paths`. Returns the table and the files that produced nothing. The first fatal parse
/// error aborts the whole build.
pub fn build_table(exp_id: &str, paths: &[PathBuf]) -> Result<(ResultTable, Vec<PathBuf>)> {
  let parsed = paths
    .par_iter()
    .map(|path| {
      info!("parsing: {}", path.display());
      parse_log_file(exp_id, path)
    })
    .collect::<Result<Vec<_>>>()?;

  let mut builder = ResultTable::builder(exp_id);
  let mut empty_files = Vec::new();
  for (path, records) in paths.iter().zip(parsed) {
    if records.is_empty() {
      warn!(
        "didn't parse any data from {} ... might still be running",
        path.display()
      );
      empty_files.push(path.clone());
      continue;
    }
    builder.append(records);
  }
  Ok((builder.finish(), empty_files))
}

/// Discover, parse, merge and persist one experiment. Any previous artifact for the same
/// experiment id is overwritten in full.
pub fn extract_experiment(config: &ExtractConfig) -> Result<(ResultTable, ExtractSummary)> {
  let paths = discover_logs(config)?;
  if paths.is_empty() {
    warn!(
      "no log files match {}; writing an empty table",
      config.log_pattern()?
    );
  }

  let (table, empty_files) = build_table(&config.exp_id, &paths)?;
  let output = config.output_path();
  write_results(&output, &table)?;

  let summary = ExtractSummary {
    output,
    files: paths.len(),
    merged: paths.len() - empty_files.len(),
    empty_files,
    rows: table.len(),
  };
  info!(
    "parsed {}, combined into {}",
    summary.merged,
    summary.output.display()
  );
  Ok((table, summary))
}
