//! The standard set of views derived from one experiment's result table.

use groupby_results_core::{
  aggregate, compute_speedup, duplicate_trials, AggregatedMetric, DuplicateTrial, ResultTable,
  RowFilter, Selection, SpeedupTable,
};

/// Knobs of the standard report. [`Default`] reproduces the usual experiment layout: the
/// `sequential` reference implementation is left out, `duckdb` and `polars` are only measured
/// end to end, and native algorithms report `aggregation_time` plus up to four phases.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
  pub excluded_algorithms: Vec<String>,
  /// Algorithms that only report an end-to-end time.
  pub engine_algorithms: Vec<String>,
  pub end_to_end_attribute: String,
  pub aggregation_attribute: String,
  pub phase_attributes: Vec<String>,
}

impl Default for ReportConfig {
  fn default() -> Self {
    ReportConfig {
      excluded_algorithms: vec!["sequential".to_string()],
      engine_algorithms: vec!["duckdb".to_string(), "polars".to_string()],
      end_to_end_attribute: "elapsed_time".to_string(),
      aggregation_attribute: "aggregation_time".to_string(),
      phase_attributes: (0..4).map(|phase| format!("phase_{phase}")).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
  pub exp_id: String,
  /// Every (identity, attribute) mean, sorted for display.
  pub aggregated: Vec<AggregatedMetric>,
  /// End-to-end latency of every algorithm.
  pub latency: Vec<AggregatedMetric>,
  /// End-to-end speedup of the engine algorithms.
  pub oob_speedup: SpeedupTable,
  /// Aggregation-phase speedup of every other algorithm.
  pub agg_speedup: SpeedupTable,
  pub phase_latency: Vec<AggregatedMetric>,
  /// Largest thread count measured; upper bound of the speedup axis.
  pub max_np: u32,
  pub duplicates: Vec<DuplicateTrial>,
}

pub fn build_report(table: &ResultTable, config: &ReportConfig) -> Report {
  let keep = RowFilter::new().with_algorithms(Selection::except(&config.excluded_algorithms));
  let aggregated = aggregate(table, &keep);

  let attribute_is = |attribute: &str| {
    aggregated
      .iter()
      .filter(|m| m.attribute == attribute)
      .cloned()
      .collect::<Vec<_>>()
  };
  let latency = attribute_is(&config.end_to_end_attribute);
  let phases = Selection::only(&config.phase_attributes);
  let phase_latency = aggregated
    .iter()
    .filter(|m| phases.contains(&m.attribute))
    .cloned()
    .collect();

  let engines = RowFilter::new().with_algorithms(Selection::only(&config.engine_algorithms));
  let native = RowFilter::new().with_algorithms(Selection::except(&config.engine_algorithms));
  let oob_speedup = compute_speedup(&aggregated, &config.end_to_end_attribute, &engines);
  let agg_speedup = compute_speedup(&aggregated, &config.aggregation_attribute, &native);

  let max_np = aggregated
    .iter()
    .map(|m| m.identity.thread_count)
    .max()
    .unwrap_or(1);

  Report {
    exp_id: table.exp_id().to_string(),
    latency,
    oob_speedup,
    agg_speedup,
    phase_latency,
    max_np,
    duplicates: duplicate_trials(table),
    aggregated,
  }
}
