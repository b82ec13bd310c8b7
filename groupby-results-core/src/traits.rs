use crate::aggregate::AggregatedMetric;
use crate::identity::LogFileIdentity;
use crate::record::MeasurementRecord;

/// The [`Row`] trait is the minimal view shared by measurement rows and aggregated rows, so
/// that one predicate can select from either table.
pub trait Row: sealed::Sealed {
  fn exp_id(&self) -> &str;
  fn identity(&self) -> &LogFileIdentity;
  fn attribute(&self) -> &str;
}

impl Row for MeasurementRecord {
  fn exp_id(&self) -> &str {
    &self.exp_id
  }

  fn identity(&self) -> &LogFileIdentity {
    &self.identity
  }

  fn attribute(&self) -> &str {
    &self.attribute
  }
}

impl Row for AggregatedMetric {
  fn exp_id(&self) -> &str {
    &self.exp_id
  }

  fn identity(&self) -> &LogFileIdentity {
    &self.identity
  }

  fn attribute(&self) -> &str {
    &self.attribute
  }
}

/// A row selection applied before grouping or joining. Any `Fn(&R) -> bool` qualifies, as does
/// [`RowFilter`](crate::filter::RowFilter).
pub trait RowPredicate<R: Row> {
  fn keep(&self, row: &R) -> bool;
}

impl<R: Row, F: Fn(&R) -> bool> RowPredicate<R> for F {
  fn keep(&self, row: &R) -> bool {
    self(row)
  }
}

mod sealed {
  pub trait Sealed {}

  impl Sealed for crate::record::MeasurementRecord {}
  impl Sealed for crate::aggregate::AggregatedMetric {}
}
