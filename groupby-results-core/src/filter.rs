//! Declarative row selections ("exclude a named algorithm", "restrict to one distribution").

use std::collections::BTreeSet;

use crate::traits::{Row, RowPredicate};

/// Membership test over one string column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
  #[default]
  Any,
  Only(BTreeSet<String>),
  Except(BTreeSet<String>),
}

impl Selection {
  pub fn only<I, S>(values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Selection::Only(values.into_iter().map(Into::into).collect())
  }

  pub fn except<I, S>(values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Selection::Except(values.into_iter().map(Into::into).collect())
  }

  pub fn contains(&self, value: &str) -> bool {
    match self {
      Selection::Any => true,
      Selection::Only(values) => values.contains(value),
      Selection::Except(values) => !values.contains(value),
    }
  }
}

/// Conjunction of per-column selections. The default filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
  pub machines: Selection,
  pub distributions: Selection,
  pub size_configs: Selection,
  pub algorithms: Selection,
  pub attributes: Selection,
  pub n_rows: Option<u64>,
}

impl RowFilter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_machines(mut self, machines: Selection) -> Self {
    self.machines = machines;
    self
  }

  pub fn with_distributions(mut self, distributions: Selection) -> Self {
    self.distributions = distributions;
    self
  }

  pub fn with_size_configs(mut self, size_configs: Selection) -> Self {
    self.size_configs = size_configs;
    self
  }

  pub fn with_algorithms(mut self, algorithms: Selection) -> Self {
    self.algorithms = algorithms;
    self
  }

  pub fn with_attributes(mut self, attributes: Selection) -> Self {
    self.attributes = attributes;
    self
  }

  pub fn with_n_rows(mut self, n_rows: u64) -> Self {
    self.n_rows = Some(n_rows);
    self
  }

  pub fn matches<R: Row>(&self, row: &R) -> bool {
    let identity = row.identity();
    self.machines.contains(&identity.machine_id)
      && self.distributions.contains(&identity.distribution)
      && self.size_configs.contains(&identity.size_config)
      && self.algorithms.contains(&identity.algorithm)
      && self.attributes.contains(row.attribute())
      && self.n_rows.map_or(true, |n_rows| identity.n_rows == n_rows)
  }
}

impl<R: Row> RowPredicate<R> for RowFilter {
  fn keep(&self, row: &R) -> bool {
    self.matches(row)
  }
}
