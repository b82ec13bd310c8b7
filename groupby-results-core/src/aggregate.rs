//! Collapse repeated trials into per-configuration means.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::identity::LogFileIdentity;
use crate::record::MeasurementRecord;
use crate::traits::RowPredicate;

/// Mean value of one (experiment, identity, attribute) group.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetric {
  pub exp_id: String,
  pub identity: LogFileIdentity,
  pub attribute: String,
  /// Mean of `value` over every trial in the group, in milliseconds.
  pub avg_time: f64,
  /// Number of rows averaged, duplicates included.
  pub trials: usize,
}

/// A trial id reported more than once for the same identity and attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTrial {
  pub exp_id: String,
  pub identity: LogFileIdentity,
  pub attribute: String,
  pub trial_id: u32,
  pub occurrences: usize,
}

type GroupKey<'a> = (&'a str, &'a LogFileIdentity, &'a str);

/// Group `records` kept by `predicate` on the full identity plus attribute and average each
/// group. Every group with at least one row yields exactly one metric; duplicated trial ids
/// are averaged like any other row.
///
/// Values are summed in ascending order so the result does not depend on input order.
pub fn aggregate<'a, I, P>(records: I, predicate: &P) -> Vec<AggregatedMetric>
where
  I: IntoIterator<Item = &'a MeasurementRecord>,
  P: RowPredicate<MeasurementRecord> + ?Sized,
{
  let mut groups: HashMap<GroupKey<'a>, Vec<f64>> = HashMap::new();
  for record in records {
    if !predicate.keep(record) {
      continue;
    }
    groups
      .entry((record.exp_id.as_str(), &record.identity, record.attribute.as_str()))
      .or_default()
      .push(record.value);
  }

  let mut metrics: Vec<AggregatedMetric> = groups
    .into_iter()
    .map(|((exp_id, identity, attribute), mut values)| {
      values.sort_by(f64::total_cmp);
      let trials = values.len();
      let avg_time = values.iter().sum::<f64>() / trials as f64;
      AggregatedMetric {
        exp_id: exp_id.to_string(),
        identity: identity.clone(),
        attribute: attribute.to_string(),
        avg_time,
        trials,
      }
    })
    .collect();
  sort_metrics(&mut metrics);
  metrics
}

/// Report every (identity, attribute, trial id) seen more than once.
pub fn duplicate_trials<'a, I>(records: I) -> Vec<DuplicateTrial>
where
  I: IntoIterator<Item = &'a MeasurementRecord>,
{
  let mut counts: HashMap<(GroupKey<'a>, u32), usize> = HashMap::new();
  for record in records {
    let key = (record.exp_id.as_str(), &record.identity, record.attribute.as_str());
    *counts.entry((key, record.trial_id)).or_default() += 1;
  }

  let mut duplicates: Vec<DuplicateTrial> = counts
    .into_iter()
    .filter(|(_, occurrences)| *occurrences > 1)
    .map(
      |(((exp_id, identity, attribute), trial_id), occurrences)| DuplicateTrial {
        exp_id: exp_id.to_string(),
        identity: identity.clone(),
        attribute: attribute.to_string(),
        trial_id,
        occurrences,
      },
    )
    .collect();
  duplicates.sort_by(|a, b| {
    (&a.exp_id, &a.identity, &a.attribute, a.trial_id).cmp(&(
      &b.exp_id,
      &b.identity,
      &b.attribute,
      b.trial_id,
    ))
  });
  duplicates
}

/// Order metrics by experiment, machine, distribution, row count, group count, algorithm,
/// attribute and finally thread count, so series read left to right by thread count.
pub fn sort_metrics(metrics: &mut [AggregatedMetric]) {
  metrics.sort_by(compare_metrics);
}

fn compare_metrics(a: &AggregatedMetric, b: &AggregatedMetric) -> Ordering {
  let (x, y) = (&a.identity, &b.identity);
  a.exp_id
    .cmp(&b.exp_id)
    .then_with(|| x.machine_id.cmp(&y.machine_id))
    .then_with(|| x.distribution.cmp(&y.distribution))
    .then_with(|| x.n_rows.cmp(&y.n_rows))
    .then_with(|| x.n_groups.cmp(&y.n_groups))
    .then_with(|| x.algorithm.cmp(&y.algorithm))
    .then_with(|| a.attribute.cmp(&b.attribute))
    .then_with(|| x.thread_count.cmp(&y.thread_count))
    .then_with(|| x.size_config.cmp(&y.size_config))
}
