//! Conversion between row-oriented tables and Arrow [`RecordBatch`]es.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use arrow::{
  array::{
    Array, ArrayRef, AsArray, Float64Array, PrimitiveArray, RecordBatch, StringArray, UInt32Array,
    UInt64Array,
  },
  datatypes::{ArrowPrimitiveType, Float64Type, UInt32Type, UInt64Type},
};
use groupby_results_core::{
  AggregatedMetric, LogFileIdentity, MeasurementRecord, ResultTable, SpeedupTable,
};

use crate::schema::{self, aggregated_schema, results_schema, speedup_schema};

fn strings<'a, T, F>(rows: &'a [T], f: F) -> ArrayRef
where
  F: Fn(&'a T) -> &'a str,
{
  Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
}

/// Lay the table out in the persisted column order.
pub fn results_to_batch(table: &ResultTable) -> Result<RecordBatch> {
  let rows = table.records();
  let columns: Vec<ArrayRef> = vec![
    strings(rows, |r| r.exp_id.as_str()),
    strings(rows, |r| r.identity.machine_id.as_str()),
    strings(rows, |r| r.identity.distribution.as_str()),
    strings(rows, |r| r.identity.size_config.as_str()),
    Arc::new(UInt64Array::from_iter_values(
      rows.iter().map(|r| r.identity.n_rows),
    )),
    Arc::new(UInt64Array::from_iter_values(
      rows.iter().map(|r| r.identity.n_groups),
    )),
    strings(rows, |r| r.identity.algorithm.as_str()),
    Arc::new(UInt32Array::from_iter_values(
      rows.iter().map(|r| r.identity.thread_count),
    )),
    Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.trial_id))),
    strings(rows, |r| r.attribute.as_str()),
    Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.value))),
  ];
  Ok(RecordBatch::try_new(results_schema(), columns)?)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
  let column = batch
    .column_by_name(name)
    .ok_or_else(|| anyhow!("result table has no `{name}` column"))?;
  if column.null_count() > 0 {
    bail!("column `{name}` contains nulls");
  }
  column
    .as_string_opt::<i32>()
    .ok_or_else(|| anyhow!("column `{name}` is {}, expected Utf8", column.data_type()))
}

fn primitive_column<'a, T: ArrowPrimitiveType>(
  batch: &'a RecordBatch,
  name: &str,
) -> Result<&'a PrimitiveArray<T>> {
  let column = batch
    .column_by_name(name)
    .ok_or_else(|| anyhow!("result table has no `{name}` column"))?;
  if column.null_count() > 0 {
    bail!("column `{name}` contains nulls");
  }
  column.as_primitive_opt::<T>().ok_or_else(|| {
    anyhow!(
      "column `{name}` is {}, expected {}",
      column.data_type(),
      T::DATA_TYPE
    )
  })
}

/// Decode a batch written by [`results_to_batch`]. Columns are looked up by name; a missing
/// column, a column of another type or a null value is an error.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<MeasurementRecord>> {
  let exp_id = string_column(batch, schema::EXP_ID)?;
  let machine_id = string_column(batch, schema::MACHINE_ID)?;
  let dist = string_column(batch, schema::DIST)?;
  let size_config = string_column(batch, schema::SIZE_CONFIG)?;
  let n_rows = primitive_column::<UInt64Type>(batch, schema::N_ROWS)?;
  let n_groups = primitive_column::<UInt64Type>(batch, schema::N_GROUPS)?;
  let algorithm = string_column(batch, schema::ALGORITHM)?;
  let np = primitive_column::<UInt32Type>(batch, schema::NP)?;
  let trial_id = primitive_column::<UInt32Type>(batch, schema::TRIAL_ID)?;
  let attribute = string_column(batch, schema::ATTRIBUTE)?;
  let value = primitive_column::<Float64Type>(batch, schema::VALUE)?;

  Ok(
    (0..batch.num_rows())
      .map(|i| MeasurementRecord {
        exp_id: exp_id.value(i).to_string(),
        identity: LogFileIdentity {
          machine_id: machine_id.value(i).to_string(),
          distribution: dist.value(i).to_string(),
          size_config: size_config.value(i).to_string(),
          n_rows: n_rows.value(i),
          n_groups: n_groups.value(i),
          algorithm: algorithm.value(i).to_string(),
          thread_count: np.value(i),
        },
        trial_id: trial_id.value(i),
        attribute: attribute.value(i).to_string(),
        value: value.value(i),
      })
      .collect(),
  )
}

pub fn aggregated_to_batch(metrics: &[AggregatedMetric]) -> Result<RecordBatch> {
  let columns: Vec<ArrayRef> = vec![
    strings(metrics, |m| m.exp_id.as_str()),
    strings(metrics, |m| m.identity.machine_id.as_str()),
    strings(metrics, |m| m.identity.distribution.as_str()),
    strings(metrics, |m| m.identity.size_config.as_str()),
    Arc::new(UInt64Array::from_iter_values(
      metrics.iter().map(|m| m.identity.n_rows),
    )),
    Arc::new(UInt64Array::from_iter_values(
      metrics.iter().map(|m| m.identity.n_groups),
    )),
    strings(metrics, |m| m.identity.algorithm.as_str()),
    Arc::new(UInt32Array::from_iter_values(
      metrics.iter().map(|m| m.identity.thread_count),
    )),
    strings(metrics, |m| m.attribute.as_str()),
    Arc::new(Float64Array::from_iter_values(
      metrics.iter().map(|m| m.avg_time),
    )),
  ];
  Ok(RecordBatch::try_new(aggregated_schema(), columns)?)
}

pub fn speedup_to_batch(table: &SpeedupTable) -> Result<RecordBatch> {
  let rows = table.records.as_slice();
  let columns: Vec<ArrayRef> = vec![
    strings(rows, |r| r.machine_id.as_str()),
    strings(rows, |r| r.distribution.as_str()),
    strings(rows, |r| r.size_config.as_str()),
    strings(rows, |r| r.algorithm.as_str()),
    Arc::new(UInt32Array::from_iter_values(
      rows.iter().map(|r| r.thread_count),
    )),
    Arc::new(rows.iter().map(|r| r.speedup).collect::<Float64Array>()),
  ];
  Ok(RecordBatch::try_new(speedup_schema(), columns)?)
}

#[cfg(test)]
mod tests {
  use arrow::datatypes::{DataType, Field, Schema};
  use groupby_results_core::{compute_speedup, parse_log};

  use super::*;

  fn table() -> ResultTable {
    let mut builder = ResultTable::builder("e1");
    for (file_name, text) in [
      (
        "uniform,8M-1K,two-phase-radix,np1.log",
        ">>> run=0, aggregation_time=90ms\n>>> run=0, phase_1=60ms\n",
      ),
      (
        "uniform,8M-1K,two-phase-radix,np4.log",
        ">>> run=0, aggregation_time=30ms\n>>> run=1, aggregation_time=20.5ms\n",
      ),
    ] {
      let identity = LogFileIdentity::from_file_name("m1", file_name).unwrap();
      builder.append(parse_log("e1", &identity, text).unwrap());
    }
    builder.finish()
  }

  #[test]
  fn test_results_batch_layout() {
    let table = table();
    let batch = results_to_batch(&table).unwrap();
    assert_eq!(batch.num_rows(), 4);
    let schema = batch.schema();
    let names: Vec<&str> = schema
      .fields()
      .iter()
      .map(|f| f.name().as_str())
      .collect();
    assert_eq!(
      names,
      vec![
        "exp_id",
        "machine_id",
        "dist",
        "size_config",
        "n_rows",
        "n_groups",
        "algorithm",
        "np",
        "trial_id",
        "attribute",
        "value"
      ]
    );
    assert_eq!(batch_to_records(&batch).unwrap(), table.records());
  }

  #[test]
  fn test_empty_table_batch() {
    let batch = results_to_batch(&ResultTable::builder("e1").finish()).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert!(batch_to_records(&batch).unwrap().is_empty());
  }

  #[test]
  fn test_wrong_column_type_is_rejected() {
    let schema = Arc::new(Schema::new(vec![Field::new(
      schema::EXP_ID,
      DataType::UInt32,
      false,
    )]));
    let batch =
      RecordBatch::try_new(schema, vec![Arc::new(UInt32Array::from(vec![1_u32]))]).unwrap();
    let err = batch_to_records(&batch).unwrap_err();
    assert!(err.to_string().contains("expected Utf8"), "{err}");
  }

  #[test]
  fn test_speedup_batch_keeps_undefined_as_null() {
    let table = table();
    let metrics = groupby_results_core::aggregate(&table, &|_: &MeasurementRecord| true);
    let no_baseline = vec![AggregatedMetric {
      identity: LogFileIdentity::from_file_name("m2", "uniform,8M-1K,polars,np2.log").unwrap(),
      ..metrics[0].clone()
    }];
    let speedup = compute_speedup(
      &[metrics, no_baseline].concat(),
      "aggregation_time",
      &|_: &AggregatedMetric| true,
    );
    let batch = speedup_to_batch(&speedup).unwrap();
    let column = batch.column(5).as_primitive::<Float64Type>();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(column.null_count(), 1);
    assert_eq!(column.value(0), 1.0);
  }
}
