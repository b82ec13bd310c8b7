//! Speedup of every configuration relative to its single-thread baseline.

use std::collections::{BTreeSet, HashMap};

use log::warn;

use crate::aggregate::AggregatedMetric;
use crate::traits::RowPredicate;

/// Thread count of the baseline run every speedup is relative to.
pub const BASELINE_THREAD_COUNT: u32 = 1;

/// `speedup` is `None` when the configuration has no single-thread baseline, or when its own
/// time is not positive (a `0ms` phase has no meaningful ratio). It is never defaulted to 0 or 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedupRecord {
  pub machine_id: String,
  pub distribution: String,
  pub size_config: String,
  pub algorithm: String,
  pub thread_count: u32,
  pub speedup: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedupTable {
  /// Attribute both sides of the ratio were measured on.
  pub attribute: String,
  pub records: Vec<SpeedupRecord>,
  /// Rows emitted without a baseline.
  pub missing_baselines: usize,
}

impl SpeedupTable {
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Records whose speedup is defined.
  pub fn defined(&self) -> impl Iterator<Item = (&SpeedupRecord, f64)> {
    self
      .records
      .iter()
      .filter_map(|record| record.speedup.map(|speedup| (record, speedup)))
  }
}

/// (machine, distribution, size_config, algorithm). Thread count is left out on purpose so a
/// row joins with the single-thread run of the same configuration.
type BaselineKey<'a> = (&'a str, &'a str, &'a str, &'a str);

fn baseline_key(metric: &AggregatedMetric) -> BaselineKey<'_> {
  let identity = &metric.identity;
  (
    identity.machine_id.as_str(),
    identity.distribution.as_str(),
    identity.size_config.as_str(),
    identity.algorithm.as_str(),
  )
}

/// Left-join every `attribute` row kept by `predicate` against the single-thread rows of the
/// same attribute, emitting `baseline / current` per match.
///
/// Baselines are taken from all `attribute` rows regardless of `predicate`, so restricting the
/// output (say, to multi-threaded runs) never removes a denominator. A key with several
/// baselines, possible only when experiments are mixed, yields one row per baseline.
pub fn compute_speedup<P>(
  metrics: &[AggregatedMetric],
  attribute: &str,
  predicate: &P,
) -> SpeedupTable
where
  P: RowPredicate<AggregatedMetric> + ?Sized,
{
  let selected = move || {
    metrics
      .iter()
      .filter(move |metric| metric.attribute == attribute)
  };

  let mut baselines: HashMap<BaselineKey<'_>, Vec<f64>> = HashMap::new();
  for metric in selected().filter(|m| m.identity.thread_count == BASELINE_THREAD_COUNT) {
    baselines
      .entry(baseline_key(metric))
      .or_default()
      .push(metric.avg_time);
  }

  let mut records = Vec::new();
  let mut missing_keys = BTreeSet::new();
  let mut missing_baselines = 0;
  for metric in selected().filter(|m| predicate.keep(*m)) {
    let key = baseline_key(metric);
    let row = |speedup: Option<f64>| SpeedupRecord {
      machine_id: metric.identity.machine_id.clone(),
      distribution: metric.identity.distribution.clone(),
      size_config: metric.identity.size_config.clone(),
      algorithm: metric.identity.algorithm.clone(),
      thread_count: metric.identity.thread_count,
      speedup,
    };
    match baselines.get(&key) {
      Some(values) => {
        let current = metric.avg_time;
        records.extend(
          values
            .iter()
            .map(|baseline| row((current > 0.0).then(|| baseline / current))),
        )
      }
      None => {
        missing_baselines += 1;
        missing_keys.insert(key);
        records.push(row(None));
      }
    }
  }

  for (machine_id, distribution, size_config, algorithm) in missing_keys {
    warn!(
      "no single-thread {attribute} baseline for {algorithm} on {machine_id} \
       ({distribution}, {size_config}); speedup left undefined"
    );
  }

  SpeedupTable {
    attribute: attribute.to_string(),
    records,
    missing_baselines,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::{RowFilter, Selection};
  use crate::identity::LogFileIdentity;

  fn metric(file_name: &str, attribute: &str, avg_time: f64) -> AggregatedMetric {
    AggregatedMetric {
      exp_id: "e1".to_string(),
      identity: LogFileIdentity::from_file_name("m1", file_name).unwrap(),
      attribute: attribute.to_string(),
      avg_time,
      trials: 5,
    }
  }

  fn keep_all(_: &AggregatedMetric) -> bool {
    true
  }

  #[test]
  fn test_speedup_against_baseline() {
    let metrics = vec![
      metric("uniform,8M-1K,polars,np1.log", "elapsed_time", 400.0),
      metric("uniform,8M-1K,polars,np4.log", "elapsed_time", 100.0),
    ];
    let table = compute_speedup(&metrics, "elapsed_time", &keep_all);
    assert_eq!(table.attribute, "elapsed_time");
    assert_eq!(table.missing_baselines, 0);
    let speedups: Vec<(u32, Option<f64>)> = table
      .records
      .iter()
      .map(|r| (r.thread_count, r.speedup))
      .collect();
    assert_eq!(speedups, vec![(1, Some(1.0)), (4, Some(4.0))]);
  }

  #[test]
  fn test_missing_baseline_is_undefined() {
    let metrics = vec![metric("uniform,8M-1K,polars,np2.log", "elapsed_time", 100.0)];
    let table = compute_speedup(&metrics, "elapsed_time", &keep_all);
    assert_eq!(table.records.len(), 1);
    assert_eq!(table.records[0].speedup, None);
    assert_eq!(table.missing_baselines, 1);
    assert_eq!(table.defined().count(), 0);
  }

  #[test]
  fn test_join_key_excludes_other_attributes_and_configs() {
    let metrics = vec![
      // Baseline of another attribute must not be used.
      metric("uniform,8M-1K,polars,np1.log", "phase_1", 50.0),
      // Baseline of another size config must not be used.
      metric("uniform,4M-1K,polars,np1.log", "elapsed_time", 80.0),
      metric("uniform,8M-1K,polars,np2.log", "elapsed_time", 100.0),
      metric("uniform,4M-1K,polars,np2.log", "elapsed_time", 40.0),
    ];
    let table = compute_speedup(&metrics, "elapsed_time", &keep_all);
    let rows: Vec<(&str, u32, Option<f64>)> = table
      .records
      .iter()
      .map(|r| (r.size_config.as_str(), r.thread_count, r.speedup))
      .collect();
    assert_eq!(
      rows,
      vec![("4M-1K", 1, Some(1.0)), ("8M-1K", 2, None), ("4M-1K", 2, Some(2.0))]
    );
  }

  #[test]
  fn test_predicate_does_not_drop_baselines() {
    let metrics = vec![
      metric("uniform,8M-1K,two-phase-radix,np1.log", "aggregation_time", 90.0),
      metric("uniform,8M-1K,two-phase-radix,np3.log", "aggregation_time", 30.0),
      metric("uniform,8M-1K,duckdb,np1.log", "aggregation_time", 10.0),
    ];
    let multi_threaded = |m: &AggregatedMetric| m.identity.thread_count > 1;
    let table = compute_speedup(&metrics, "aggregation_time", &multi_threaded);
    assert_eq!(table.records.len(), 1);
    assert_eq!(table.records[0].speedup, Some(3.0));

    let engines_excluded =
      RowFilter::new().with_algorithms(Selection::except(["duckdb", "polars"]));
    let table = compute_speedup(&metrics, "aggregation_time", &engines_excluded);
    assert!(table.records.iter().all(|r| r.algorithm == "two-phase-radix"));
    assert_eq!(table.records.len(), 2);
  }

  #[test]
  fn test_zero_time_has_no_speedup() {
    let metrics = vec![
      metric("uniform,8M-1K,two-phase-radix,np1.log", "aggregation_time", 10.0),
      metric("uniform,8M-1K,two-phase-radix,np4.log", "aggregation_time", 0.0),
      metric("uniform,8M-1K,two-phase-radix,np8.log", "aggregation_time", -5.0),
    ];
    let table = compute_speedup(&metrics, "aggregation_time", &keep_all);
    let speedups: Vec<Option<f64>> = table.records.iter().map(|r| r.speedup).collect();
    assert_eq!(speedups, vec![Some(1.0), None, None]);
    // the baseline exists, only the ratio is undefined
    assert_eq!(table.missing_baselines, 0);
  }

  #[test]
  fn test_empty_input() {
    let table = compute_speedup(&[], "elapsed_time", &keep_all);
    assert!(table.is_empty());
    assert_eq!(table.missing_baselines, 0);
  }
}
